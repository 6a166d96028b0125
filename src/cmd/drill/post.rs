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

use axum::Form;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use serde::Deserialize;
use vocacards_core::Answer;
use vocacards_core::Command;

use crate::cmd::drill::state::ServerState;

#[derive(Deserialize)]
pub struct ActionForm {
    #[serde(default)]
    block: usize,
    action: Action,
}

#[derive(Clone, Copy, Debug, Deserialize)]
enum Action {
    Right,
    Wrong,
    Reveal,
    Auto,
    Mode,
    Invert,
    Reload,
    Switch,
    Clean,
    Shutdown,
}

impl Action {
    fn command(self) -> Option<Command> {
        let command = match self {
            Action::Right => Command::Confirm(Answer::Right),
            Action::Wrong => Command::Confirm(Answer::Wrong),
            Action::Reveal => Command::Reveal,
            Action::Auto => Command::ToggleAuto,
            Action::Mode => Command::ToggleMode,
            Action::Invert => Command::ToggleInvert,
            Action::Reload => Command::Reload,
            Action::Switch => Command::SwitchView,
            Action::Clean => Command::CleanupStats,
            Action::Shutdown => return None,
        };
        Some(command)
    }
}

pub async fn post_handler(
    State(state): State<ServerState>,
    Form(form): Form<ActionForm>,
) -> Response {
    let Some(command) = form.action.command() else {
        state.shutdown();
        return (StatusCode::OK, Html("Server stopped.".to_string())).into_response();
    };
    state.lock().run(&state, form.block, command);
    Redirect::to("/").into_response()
}
