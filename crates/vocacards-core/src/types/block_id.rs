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

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

/// Prefix of the token written into a fence header when an id is minted.
pub const ID_PREFIX: &str = "id:";

/// The durable identity of a rendered block: the attribute text that
/// follows the block keyword on its opening fence line.
///
/// Ids minted by this library look like `id:1718000000000`, but any
/// attribute text already present in the header is accepted as-is.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Read an id from header attribute text. Blank text has no id.
    pub fn parse(attributes: &str) -> Option<Self> {
        let trimmed = attributes.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The id minted at the given Unix time in milliseconds.
    pub fn from_millis(millis: i64) -> Self {
        Self(format!("{ID_PREFIX}{millis}"))
    }

    /// The timestamp of a minted id, if this is one.
    pub fn millis(&self) -> Option<i64> {
        self.0.strip_prefix(ID_PREFIX)?.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BlockId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
