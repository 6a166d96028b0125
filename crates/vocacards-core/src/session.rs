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

//! The per-block session: rendering state, answers, and automatic mode.
//!
//! A [`Session`] is driven by [`Command`]s. It never sleeps: when automatic
//! mode needs to wait, the returned [`Outcome`] asks the host to schedule a
//! [`Command::Tick`] carrying a [`Ticket`]. Only the most recently issued
//! ticket is honoured, so a timer that fires after it was cancelled has no
//! effect.

use std::fmt::Display;
use std::fmt::Formatter;
use std::time::Duration;

use crate::block::BlockKind;
use crate::block::BlockRef;
use crate::block::deck_source;
use crate::block::locate;
use crate::block::switch_kind;
use crate::error::Fallible;
use crate::host::find_section;
use crate::plugin::Plugin;
use crate::select::Selection;
use crate::select::SelectionMode;
use crate::select::next_card;
use crate::stats::StatStore;
use crate::types::block_id::BlockId;
use crate::types::card_list::CardList;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Answer {
    Right,
    Wrong,
}

/// Identifies one scheduled automatic-mode step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Confirm(Answer),
    /// Show the hidden half of the card.
    Reveal,
    ToggleAuto,
    ToggleMode,
    ToggleInvert,
    /// Re-read the block from its document.
    Reload,
    /// Rewrite the block header to the other view.
    SwitchView,
    /// Sweep stats of blocks that no longer exist anywhere.
    CleanupStats,
    /// A scheduled timer fired.
    Tick(Ticket),
}

/// Something to tell the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    NoContext,
    OnlyOneCard,
    EmptyDeck,
    ConfirmDisabled,
    ModeChanged(SelectionMode),
    NothingToClean,
    StatsCleaned(usize),
    SaveFailed,
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::NoContext => write!(f, "Cannot find this block in its note"),
            Notice::OnlyOneCard => write!(f, "Only one card"),
            Notice::EmptyDeck => write!(f, "No card"),
            Notice::ConfirmDisabled => write!(f, "Buttons are disabled in automatic mode"),
            Notice::ModeChanged(SelectionMode::Random) => write!(f, "Mode: Random"),
            Notice::ModeChanged(SelectionMode::Next) => write!(f, "Mode: Next"),
            Notice::NothingToClean => write!(f, "Nothing to clean"),
            Notice::StatsCleaned(n) => write!(f, "Stats cleaned ({n} blocks)"),
            Notice::SaveFailed => write!(f, "Could not save stats"),
        }
    }
}

/// Ask the host to send `Tick(ticket)` back after `after`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scheduled {
    pub ticket: Ticket,
    pub after: Duration,
}

/// What the host must do after a command.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outcome {
    pub notices: Vec<Notice>,
    pub schedule: Option<Scheduled>,
    /// A previously scheduled tick that will no longer be honoured.
    pub cancel: Option<Ticket>,
}

impl Outcome {
    fn notice(notice: Notice) -> Self {
        Self {
            notices: vec![notice],
            ..Self::default()
        }
    }
}

/// Where automatic mode is in its cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutoPhase {
    Idle,
    /// A card is on display; the ticket reveals it.
    Showing(Ticket),
    /// The answer is revealed; the ticket advances to the next card.
    Revealing(Ticket),
}

impl AutoPhase {
    fn pending(self) -> Option<Ticket> {
        match self {
            AutoPhase::Idle => None,
            AutoPhase::Showing(t) | AutoPhase::Revealing(t) => Some(t),
        }
    }
}

/// A card ready for display.
#[derive(Clone, Debug, PartialEq)]
pub struct CardFace {
    /// The half shown up front.
    pub prompt: String,
    /// The half hidden until revealed.
    pub answer: String,
    pub transcription: Option<String>,
    pub right: u32,
    pub wrong: u32,
    pub deck_size: usize,
    pub revealed: bool,
    pub mode: SelectionMode,
    pub invert: bool,
    pub auto: bool,
    pub confirm_enabled: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableRow {
    pub derivative: String,
    pub transcription: Option<String>,
    pub explanation: String,
}

/// A snapshot of a block for presentation.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    NoContext,
    Empty(BlockKind),
    Card(CardFace),
    Table(Vec<TableRow>),
}

pub struct Session {
    view: BlockKind,
    /// Whether the block was found on the last read.
    context: bool,
    list: CardList,
    stats: StatStore,
    revealed: bool,
    auto: AutoPhase,
    tickets: u64,
}

impl Session {
    /// Initial render: read the deck, resolve the block id, prune stale
    /// stats and pick the first card.
    pub fn open(plugin: &mut Plugin, block: BlockRef) -> Fallible<Self> {
        let mut session = Self {
            view: BlockKind::Card,
            context: false,
            list: CardList::new(Vec::new()),
            stats: StatStore::new(block),
            revealed: false,
            auto: AutoPhase::Idle,
            tickets: 0,
        };
        session.render(plugin)?;
        Ok(session)
    }

    pub fn block(&self) -> &BlockRef {
        self.stats.block()
    }

    pub fn id(&self) -> Option<&BlockId> {
        self.stats.id()
    }

    pub fn view(&self) -> BlockKind {
        self.view
    }

    pub fn cards(&self) -> &CardList {
        &self.list
    }

    pub fn auto_phase(&self) -> AutoPhase {
        self.auto
    }

    pub fn is_auto(&self) -> bool {
        self.auto != AutoPhase::Idle
    }

    /// Apply a command.
    ///
    /// A failed save is logged and returned; the displayed card and the
    /// automatic mode are left as they were before the command.
    pub fn handle(&mut self, plugin: &mut Plugin, command: Command) -> Fallible<Outcome> {
        log::debug!("{:?} on block {}", command, self.block().ordinal);
        let result = self.dispatch(plugin, command);
        if let Err(e) = &result {
            log::error!("{command:?} failed on {}: {e}", self.block().path);
        }
        result
    }

    fn dispatch(&mut self, plugin: &mut Plugin, command: Command) -> Fallible<Outcome> {
        match command {
            Command::CleanupStats => return self.cleanup(plugin),
            Command::Reload => {
                self.render(plugin)?;
                return Ok(self.context_outcome());
            }
            Command::Tick(ticket) => return self.tick(plugin, ticket),
            _ => {}
        }
        if !self.context {
            return Ok(Outcome::notice(Notice::NoContext));
        }
        match command {
            Command::SwitchView => self.switch_view(plugin),
            _ if self.view == BlockKind::Table => Ok(Outcome::default()),
            Command::Confirm(answer) => self.confirm(plugin, answer),
            Command::Reveal => {
                self.revealed = true;
                Ok(Outcome::default())
            }
            Command::ToggleAuto => self.toggle_auto(plugin),
            Command::ToggleMode => {
                plugin.config.mode = plugin.config.mode.toggled();
                Ok(Outcome::notice(Notice::ModeChanged(plugin.config.mode)))
            }
            Command::ToggleInvert => {
                plugin.config.invert = !plugin.config.invert;
                self.revealed = false;
                Ok(Outcome::default())
            }
            Command::CleanupStats | Command::Reload | Command::Tick(_) => Ok(Outcome::default()),
        }
    }

    /// A snapshot for presentation.
    pub fn frame(&self, plugin: &Plugin) -> Frame {
        if !self.context {
            return Frame::NoContext;
        }
        if self.list.is_empty() {
            return Frame::Empty(self.view);
        }
        match self.view {
            BlockKind::Table => Frame::Table(
                self.list
                    .cards()
                    .iter()
                    .map(|card| TableRow {
                        derivative: card.derivative().to_string(),
                        transcription: card.transcription().map(str::to_string),
                        explanation: card.explanation().to_string(),
                    })
                    .collect(),
            ),
            BlockKind::Card => {
                let Some(card) = self.list.current() else {
                    return Frame::Empty(self.view);
                };
                let config = plugin.config;
                let (right, wrong) = self.stats.get_stats(&plugin.settings, card);
                let (prompt, answer) = if config.invert {
                    (card.explanation(), card.derivative())
                } else {
                    (card.derivative(), card.explanation())
                };
                Frame::Card(CardFace {
                    prompt: prompt.to_string(),
                    answer: answer.to_string(),
                    transcription: card.transcription().map(str::to_string),
                    right,
                    wrong,
                    deck_size: self.list.len(),
                    revealed: self.revealed,
                    mode: config.mode,
                    invert: config.invert,
                    auto: self.is_auto(),
                    confirm_enabled: !(self.is_auto()
                        && plugin.settings.disable_confirmation_buttons),
                })
            }
        }
    }

    /// Re-read the block and refresh the deck.
    fn render(&mut self, plugin: &mut Plugin) -> Fallible<()> {
        let Some((text, section)) = find_section(&*plugin.host, self.stats.block()) else {
            self.context = false;
            self.list = CardList::new(Vec::new());
            return Ok(());
        };
        self.context = true;
        self.view = section.header.kind;
        self.list.update_source(&deck_source(&text, &section));
        if self.view == BlockKind::Table || self.list.is_empty() {
            return Ok(());
        }
        self.stats
            .resolve_id(&mut *plugin.host, &mut plugin.minter, &*plugin.clock)?;
        self.stats.hydrate(&plugin.settings, &mut self.list);
        self.stats
            .cleanup_saved_stats(&mut plugin.settings, &mut *plugin.store, &self.list)?;
        if self.list.current().is_none() {
            self.advance(plugin)?;
        }
        Ok(())
    }

    /// Prune stale stats and display the next card.
    fn advance(&mut self, plugin: &mut Plugin) -> Fallible<Selection> {
        if !self.list.is_empty() {
            self.stats
                .resolve_id(&mut *plugin.host, &mut plugin.minter, &*plugin.clock)?;
        }
        self.stats
            .cleanup_saved_stats(&mut plugin.settings, &mut *plugin.store, &self.list)?;
        let stats = &self.stats;
        let settings = &plugin.settings;
        let selection = next_card(
            plugin.config.mode,
            &mut self.list,
            |card| stats.get_stats(settings, card),
            &mut *plugin.rng,
        );
        if let Selection::Card(i) = selection {
            self.list.set_current(Some(i));
            self.revealed = false;
        }
        Ok(selection)
    }

    fn confirm(&mut self, plugin: &mut Plugin, answer: Answer) -> Fallible<Outcome> {
        if self.is_auto() && plugin.settings.disable_confirmation_buttons {
            return Ok(Outcome::notice(Notice::ConfirmDisabled));
        }
        let Some(index) = self.list.current_index() else {
            return Ok(Outcome::notice(Notice::EmptyDeck));
        };
        if self.list.candidates().is_empty() {
            return Ok(Outcome::notice(Notice::OnlyOneCard));
        }
        let Some(card) = self.list.cards_mut().get_mut(index) else {
            return Ok(Outcome::default());
        };
        self.stats.record_answer(
            &mut plugin.settings,
            &mut *plugin.store,
            card,
            answer == Answer::Right,
        )?;
        if self.is_auto() {
            let mut outcome = Outcome {
                cancel: self.auto.pending(),
                ..Outcome::default()
            };
            self.start_cycle(plugin, &mut outcome)?;
            return Ok(outcome);
        }
        self.advance(plugin)?;
        Ok(Outcome::default())
    }

    fn toggle_auto(&mut self, plugin: &mut Plugin) -> Fallible<Outcome> {
        if let Some(ticket) = self.auto.pending() {
            log::debug!("Automatic mode off");
            self.auto = AutoPhase::Idle;
            return Ok(Outcome {
                cancel: Some(ticket),
                ..Outcome::default()
            });
        }
        log::debug!("Automatic mode on");
        let mut outcome = Outcome::default();
        self.start_cycle(plugin, &mut outcome)?;
        Ok(outcome)
    }

    /// Show the next card and wait `showTime` before revealing it. Stops
    /// automatic mode if there is no other card.
    fn start_cycle(&mut self, plugin: &mut Plugin, outcome: &mut Outcome) -> Fallible<()> {
        if self.advance(plugin)? == Selection::NoCandidate {
            log::debug!("Automatic mode stopped: nothing to advance to");
            self.auto = AutoPhase::Idle;
            outcome.notices.push(if self.list.is_empty() {
                Notice::EmptyDeck
            } else {
                Notice::OnlyOneCard
            });
            return Ok(());
        }
        let ticket = self.issue();
        self.auto = AutoPhase::Showing(ticket);
        outcome.schedule = Some(Scheduled {
            ticket,
            after: plugin.settings.show_duration(),
        });
        Ok(())
    }

    fn tick(&mut self, plugin: &mut Plugin, ticket: Ticket) -> Fallible<Outcome> {
        if self.auto.pending() != Some(ticket) {
            log::debug!("Ignoring stale tick {ticket:?}");
            return Ok(Outcome::default());
        }
        let mut outcome = Outcome::default();
        match self.auto {
            AutoPhase::Showing(_) => {
                self.revealed = true;
                let next = self.issue();
                self.auto = AutoPhase::Revealing(next);
                outcome.schedule = Some(Scheduled {
                    ticket: next,
                    after: plugin.settings.explain_duration(),
                });
            }
            AutoPhase::Revealing(_) => {
                if let Err(e) = self.start_cycle(plugin, &mut outcome) {
                    // No timer is left to drive the cycle.
                    self.auto = AutoPhase::Idle;
                    return Err(e);
                }
            }
            AutoPhase::Idle => {}
        }
        Ok(outcome)
    }

    fn switch_view(&mut self, plugin: &mut Plugin) -> Fallible<Outcome> {
        let block = self.stats.block().clone();
        let from = self.view;
        plugin.host.process(&block.path, &mut |text: &str| {
            match locate(text, block.ordinal) {
                Some(section) if section.header.kind == from => switch_kind(text, &section),
                _ => text.to_string(),
            }
        })?;
        log::info!("Switched block {} of {} away from {from}", block.ordinal, block.path);
        let outcome = Outcome {
            cancel: self.auto.pending(),
            ..Outcome::default()
        };
        self.auto = AutoPhase::Idle;
        self.revealed = false;
        self.render(plugin)?;
        Ok(outcome)
    }

    fn cleanup(&mut self, plugin: &mut Plugin) -> Fallible<Outcome> {
        let report = plugin.cleanup_stats()?;
        let notice = if report.removed.is_empty() {
            Notice::NothingToClean
        } else {
            Notice::StatsCleaned(report.removed.len())
        };
        Ok(Outcome::notice(notice))
    }

    fn context_outcome(&self) -> Outcome {
        if self.context {
            Outcome::default()
        } else {
            Outcome::notice(Notice::NoContext)
        }
    }

    fn issue(&mut self) -> Ticket {
        self.tickets += 1;
        Ticket(self.tickets)
    }
}
