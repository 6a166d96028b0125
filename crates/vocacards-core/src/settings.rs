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

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::Fallible;
use crate::error::fail;
use crate::select::SelectionMode;
use crate::types::block_id::BlockId;
use crate::types::stat_record::PageStats;
use crate::types::stat_record::StatRecord;

/// Shortest and longest automatic-mode delay, in seconds.
const MIN_TIME: f64 = 1.0;
const MAX_TIME: f64 = 5.0;
/// Delays are adjusted in steps of this many seconds.
const TIME_STEP: f64 = 0.5;
const DEFAULT_TIME: f64 = 3.0;

/// Persisted plugin settings.
///
/// Field names on disk are camelCase.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Stat records of every block, keyed by block id.
    pub stats: BTreeMap<BlockId, PageStats>,
    /// Seconds a card is shown before its answer is revealed in automatic
    /// mode.
    pub show_time: f64,
    /// Seconds the answer stays revealed before automatic mode advances.
    pub explain_time: f64,
    /// Whether the right/wrong buttons are disabled in automatic mode.
    pub disable_confirmation_buttons: bool,
    pub show_context_menu_button: bool,
    pub use_dropdown_menu: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stats: BTreeMap::new(),
            show_time: DEFAULT_TIME,
            explain_time: DEFAULT_TIME,
            disable_confirmation_buttons: true,
            show_context_menu_button: false,
            use_dropdown_menu: false,
        }
    }
}

impl Settings {
    /// Build settings from whatever was stored, field by field.
    ///
    /// Missing fields take their default. Fields of the wrong shape are
    /// logged and take their default. Unknown fields are dropped.
    pub fn from_value(value: Option<Value>) -> Self {
        let mut settings = Settings::default();
        let map = match value {
            None | Some(Value::Null) => return settings,
            Some(Value::Object(map)) => map,
            Some(other) => {
                log::warn!("Ignoring stored settings: expected an object, found {other}");
                return settings;
            }
        };
        for (key, value) in map {
            match key.as_str() {
                "stats" => settings.stats = read_stats(value),
                "showTime" => match read_time(&value) {
                    Some(t) => settings.show_time = t,
                    None => warn_field(&key, &value),
                },
                "explainTime" => match read_time(&value) {
                    Some(t) => settings.explain_time = t,
                    None => warn_field(&key, &value),
                },
                "disableConfirmationButtons" => match value.as_bool() {
                    Some(b) => settings.disable_confirmation_buttons = b,
                    None => warn_field(&key, &value),
                },
                "showContextMenuButton" => match value.as_bool() {
                    Some(b) => settings.show_context_menu_button = b,
                    None => warn_field(&key, &value),
                },
                "useDropdownMenu" => match value.as_bool() {
                    Some(b) => settings.use_dropdown_menu = b,
                    None => warn_field(&key, &value),
                },
                _ => log::debug!("Dropping unknown setting {key}"),
            }
        }
        settings
    }

    pub fn set_show_time(&mut self, seconds: f64) {
        self.show_time = snap_time(seconds).unwrap_or(DEFAULT_TIME);
    }

    pub fn set_explain_time(&mut self, seconds: f64) {
        self.explain_time = snap_time(seconds).unwrap_or(DEFAULT_TIME);
    }

    pub fn show_duration(&self) -> Duration {
        Duration::from_secs_f64(self.show_time)
    }

    pub fn explain_duration(&self) -> Duration {
        Duration::from_secs_f64(self.explain_time)
    }
}

fn warn_field(key: &str, value: &Value) {
    log::warn!("Ignoring setting {key}: unexpected value {value}");
}

fn read_time(value: &Value) -> Option<f64> {
    value.as_f64().and_then(snap_time)
}

/// Clamp a delay into range and round it to the nearest step. Negative,
/// zero and non-finite delays are rejected.
fn snap_time(seconds: f64) -> Option<f64> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    let snapped = (seconds / TIME_STEP).round() * TIME_STEP;
    Some(snapped.clamp(MIN_TIME, MAX_TIME))
}

fn read_stats(value: Value) -> BTreeMap<BlockId, PageStats> {
    let mut stats = BTreeMap::new();
    let Value::Object(blocks) = value else {
        log::warn!("Ignoring stored stats: expected an object");
        return stats;
    };
    for (id, page) in blocks {
        let Some(id) = BlockId::parse(&id) else {
            continue;
        };
        let Value::Object(page) = page else {
            log::warn!("Dropping stats of {id}: expected an object");
            continue;
        };
        stats.insert(id, read_page(page));
    }
    stats
}

fn read_page(page: Map<String, Value>) -> PageStats {
    let mut records = PageStats::new();
    for (derivative, record) in page {
        match serde_json::from_value::<StatRecord>(record) {
            Ok(record) => {
                records.insert(derivative, record);
            }
            Err(e) => log::warn!("Dropping stat record of {derivative:?}: {e}"),
        }
    }
    records
}

/// Persistent storage for [`Settings`].
pub trait SettingsStore {
    /// The stored settings blob, if any.
    fn load(&self) -> Fallible<Option<Value>>;

    /// Replace the stored settings. Returns once the write is complete.
    fn save(&mut self, settings: &Settings) -> Fallible<()>;
}

/// Settings kept in memory.
#[derive(Default)]
pub struct MemoryStore {
    stored: Option<Value>,
    saves: usize,
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: Value) -> Self {
        Self {
            stored: Some(value),
            ..Self::default()
        }
    }

    pub fn stored(&self) -> Option<&Value> {
        self.stored.as_ref()
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.saves
    }

    /// Make every subsequent save fail.
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Fallible<Option<Value>> {
        Ok(self.stored.clone())
    }

    fn save(&mut self, settings: &Settings) -> Fallible<()> {
        if self.failing {
            return fail("settings store is unavailable.");
        }
        self.stored = Some(serde_json::to_value(settings)?);
        self.saves += 1;
        Ok(())
    }
}

/// Process-wide study options shared by every block. Not persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StudyConfig {
    pub mode: SelectionMode,
    /// Show the explanation as the prompt and hide the derivative.
    pub invert: bool,
}
