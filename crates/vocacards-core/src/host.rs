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

//! The seams between the core and the application hosting it.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::block::BlockRef;
use crate::block::Section;
use crate::block::locate;
use crate::error::Fallible;
use crate::error::fail;

/// The document store of the hosting application.
pub trait Host {
    /// Paths of every document, in a stable order.
    fn documents(&self) -> Fallible<Vec<String>>;

    /// A snapshot of a document's full text.
    fn read(&self, path: &str) -> Fallible<String>;

    /// Rewrite a document atomically: `edit` receives the current text and
    /// returns the replacement.
    fn process(&mut self, path: &str, edit: &mut dyn FnMut(&str) -> String) -> Fallible<()>;
}

/// Wall-clock time, used to mint block ids.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

#[cfg(feature = "clock")]
pub struct SystemClock;

#[cfg(feature = "clock")]
impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that always reads the same time.
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Read the document holding `block` and locate the block in it.
///
/// Fails soft: an unreadable document or a missing block yields `None`.
pub fn find_section(host: &dyn Host, block: &BlockRef) -> Option<(String, Section)> {
    let text = match host.read(&block.path) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Cannot read {}: {e}", block.path);
            return None;
        }
    };
    let section = locate(&text, block.ordinal)?;
    Some((text, section))
}

/// An in-memory document store.
#[derive(Default)]
pub struct MemoryVault {
    documents: BTreeMap<String, String>,
    unreadable: BTreeSet<String>,
    writes: usize,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.documents.insert(path.into(), text.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.documents.get(path).map(|s| s.as_str())
    }

    /// Make reads of `path` fail.
    pub fn mark_unreadable(&mut self, path: impl Into<String>) {
        self.unreadable.insert(path.into());
    }

    /// Number of rewrites performed so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl Host for MemoryVault {
    fn documents(&self) -> Fallible<Vec<String>> {
        Ok(self.documents.keys().cloned().collect())
    }

    fn read(&self, path: &str) -> Fallible<String> {
        if self.unreadable.contains(path) {
            return fail(format!("{path} is unreadable."));
        }
        match self.documents.get(path) {
            Some(text) => Ok(text.clone()),
            None => fail(format!("no such document: {path}")),
        }
    }

    fn process(&mut self, path: &str, edit: &mut dyn FnMut(&str) -> String) -> Fallible<()> {
        let Some(text) = self.documents.get_mut(path) else {
            return fail(format!("no such document: {path}"));
        };
        let new = edit(text.as_str());
        if new != *text {
            *text = new;
            self.writes += 1;
        }
        Ok(())
    }
}
