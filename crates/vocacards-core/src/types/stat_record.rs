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

use serde::Deserialize;
use serde::Serialize;

/// Right/wrong answer counters for one derivative under one block id.
///
/// The short field names are the on-disk format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRecord {
    pub r: u32,
    pub w: u32,
}

impl StatRecord {
    pub fn new(right: u32, wrong: u32) -> Self {
        Self { r: right, w: wrong }
    }

    /// The record as a `(right, wrong)` pair.
    pub fn pair(self) -> (u32, u32) {
        (self.r, self.w)
    }
}

/// Stat records of one block, keyed by derivative.
pub type PageStats = BTreeMap<String, StatRecord>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fallible;

    #[test]
    fn test_serialize() -> Fallible<()> {
        let record = StatRecord::new(2, 0);
        assert_eq!(serde_json::to_string(&record)?, r#"{"r":2,"w":0}"#);
        Ok(())
    }

    #[test]
    fn test_negative_counts_rejected() {
        let result: Result<StatRecord, _> = serde_json::from_str(r#"{"r":-1,"w":0}"#);
        assert!(result.is_err());
    }
}
