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

//! vocacards-core: Core library for vocabulary flash cards kept in notes.
//!
//! This library has no file-system or network code. It provides:
//! - Parsing vocabulary decks out of the text that follows a code block
//! - Locating, stamping and rewriting `voca-card` / `voca-table` fences
//! - Per-block right/wrong statistics keyed by a durable block id
//! - Weighted-random and sequential card selection
//! - The per-block session state machine, including automatic mode

pub mod block;
pub mod error;
pub mod host;
pub mod parser;
pub mod plugin;
pub mod rng;
pub mod select;
pub mod session;
pub mod settings;
pub mod stats;
pub mod types;

// Re-exports for convenience
pub use block::{BlockKind, BlockRef};
pub use error::{ErrorReport, Fallible, fail};
pub use host::{Clock, Host, MemoryVault};
pub use parser::{parse_cards, parse_cards_strict};
pub use plugin::Plugin;
pub use rng::{RandomSource, TinyRng};
pub use select::{Selection, SelectionMode};
pub use session::{
    Answer, AutoPhase, CardFace, Command, Frame, Notice, Outcome, Scheduled, Session, TableRow,
    Ticket,
};
pub use settings::{MemoryStore, Settings, SettingsStore, StudyConfig};
pub use stats::SweepReport;
pub use types::block_id::BlockId;
pub use types::card::Card;
pub use types::card_list::CardList;
pub use types::stat_record::{PageStats, StatRecord};
