// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::mem::take;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use maud::Markup;
use maud::html;
use vocacards_core::BlockKind;
use vocacards_core::CardFace;
use vocacards_core::Frame;
use vocacards_core::Plugin;
use vocacards_core::SelectionMode;
use vocacards_core::TableRow;

use crate::cmd::drill::state::BlockState;
use crate::cmd::drill::state::MutableState;
use crate::cmd::drill::state::ServerState;
use crate::cmd::drill::template::page_template;

pub async fn get_handler(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    let mut mutable = state.lock();
    let refresh = mutable.blocks.iter().any(|block| block.session.is_auto());
    let MutableState { plugin, blocks } = &mut *mutable;
    let rendered: Vec<Markup> = blocks
        .iter_mut()
        .enumerate()
        .map(|(index, block)| render_block(plugin, index, block))
        .collect();
    let body = html! {
        div.root {
            div.header {
                h1 { (state.note) }
                form.header-action action="/" method="post" {
                    button type="submit" name="action" value="Shutdown" title="Stop the server." { "Quit" }
                }
            }
            @for block in &rendered {
                (block)
            }
        }
    };
    let page = page_template(&state.note, body, refresh);
    (StatusCode::OK, Html(page.into_string()))
}

/// Render a block, consuming its pending notices.
fn render_block(plugin: &Plugin, index: usize, block: &mut BlockState) -> Markup {
    let notices = take(&mut block.notices);
    let view = block.session.view();
    let content = match block.session.frame(plugin) {
        Frame::NoContext => html! {
            p.missing { "Cannot find this block in its note." }
        },
        Frame::Empty(_) => html! {
            p.empty { "No card" }
        },
        Frame::Card(face) => render_card(index, &face),
        Frame::Table(rows) => render_table(&rows),
    };
    let switch_label = match view {
        BlockKind::Card => "Table view",
        BlockKind::Table => "Card view",
    };
    html! {
        section.block {
            @for notice in &notices {
                p.notice { (notice) }
            }
            (content)
            form.options action="/" method="post" {
                input type="hidden" name="block" value=(index);
                button type="submit" name="action" value="Reload" title="Read the block again." { "Reload" }
                button type="submit" name="action" value="Switch" { (switch_label) }
                button type="submit" name="action" value="Clean" title="Delete stats of deleted blocks." { "Clean stats" }
            }
        }
    }
}

fn render_card(index: usize, face: &CardFace) -> Markup {
    let answer_class = if face.revealed {
        "answer"
    } else {
        "answer blurred"
    };
    let transcription = face.transcription.as_ref().map(|t| {
        html! {
            span.transcription { "[" (t) "]" }
        }
    });
    let mode_label = match face.mode {
        SelectionMode::Random => "Mode: Random",
        SelectionMode::Next => "Mode: Next",
    };
    html! {
        div.card {
            div.prompt {
                (face.prompt)
                @if !face.invert {
                    @if let Some(t) = &transcription { " " (t) }
                }
            }
            div class=(answer_class) {
                (face.answer)
                @if face.invert {
                    @if let Some(t) = &transcription { " " (t) }
                }
            }
            div.counts {
                span.right title="Right answers" { "✓ " (face.right) }
                " "
                span.wrong title="Wrong answers" { "✗ " (face.wrong) }
                " "
                span.size { (face.deck_size) " cards" }
            }
        }
        form.controls action="/" method="post" {
            input type="hidden" name="block" value=(index);
            button type="submit" name="action" value="Wrong" disabled[!face.confirm_enabled] { "Repeat" }
            button type="submit" name="action" value="Reveal" disabled[face.revealed] { "Show" }
            button type="submit" name="action" value="Right" disabled[!face.confirm_enabled] { "I know" }
        }
        form.controls action="/" method="post" {
            input type="hidden" name="block" value=(index);
            button type="submit" name="action" value="Auto" {
                @if face.auto { "Stop" } @else { "Auto" }
            }
            button type="submit" name="action" value="Mode" { (mode_label) }
            button type="submit" name="action" value="Invert" {
                @if face.invert { "Word first" } @else { "Meaning first" }
            }
        }
    }
}

fn render_table(rows: &[TableRow]) -> Markup {
    html! {
        table.vocab {
            thead {
                tr {
                    th { "Word" }
                    th { "Transcription" }
                    th { "Meaning" }
                }
            }
            tbody {
                @for row in rows {
                    tr {
                        td { (row.derivative) }
                        td {
                            @if let Some(t) = &row.transcription { (t) }
                        }
                        td { (row.explanation) }
                    }
                }
            }
        }
    }
}
