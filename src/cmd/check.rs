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
use std::fmt::Display;
use std::fmt::Formatter;

use vocacards_core::BlockId;
use vocacards_core::Fallible;
use vocacards_core::Host;
use vocacards_core::block::deck_source;
use vocacards_core::block::sections;
use vocacards_core::fail;
use vocacards_core::parse_cards_strict;
use vocacards_core::parser::CardParseError;

use crate::collection::Collection;

pub fn check_collection(directory: Option<String>) -> Fallible<()> {
    let vault = Collection::new(directory)?.vault();
    let problems = find_problems(&vault)?;
    if problems.is_empty() {
        println!("All vocabulary blocks are well-formed.");
        return Ok(());
    }
    for problem in &problems {
        eprintln!("{problem}");
    }
    fail(format!("found {} problems.", problems.len()))
}

#[derive(Debug, PartialEq)]
enum Problem {
    /// A deck line that is not a card.
    Malformed {
        path: String,
        ordinal: usize,
        error: CardParseError,
    },
    /// Two blocks share an id, and with it their stats.
    DuplicateId {
        id: BlockId,
        first: String,
        second: String,
    },
    Unreadable {
        path: String,
        message: String,
    },
}

impl Display for Problem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Problem::Malformed {
                path,
                ordinal,
                error,
            } => write!(f, "{path}, block {}: {error}", ordinal + 1),
            Problem::DuplicateId { id, first, second } => {
                write!(f, "{second}: {id} is already used in {first}")
            }
            Problem::Unreadable { path, message } => write!(f, "{path}: {message}"),
        }
    }
}

fn find_problems(vault: &dyn Host) -> Fallible<Vec<Problem>> {
    let mut problems = Vec::new();
    let mut seen: BTreeMap<BlockId, String> = BTreeMap::new();
    for path in vault.documents()? {
        let text = match vault.read(&path) {
            Ok(text) => text,
            Err(e) => {
                problems.push(Problem::Unreadable {
                    path,
                    message: e.message().to_string(),
                });
                continue;
            }
        };
        for (ordinal, section) in sections(&text).iter().enumerate() {
            if let Err(error) = parse_cards_strict(&deck_source(&text, section)) {
                problems.push(Problem::Malformed {
                    path: path.clone(),
                    ordinal,
                    error,
                });
            }
            let Some(id) = section.header.id() else {
                continue;
            };
            match seen.get(&id) {
                Some(first) => problems.push(Problem::DuplicateId {
                    id,
                    first: first.clone(),
                    second: path.clone(),
                }),
                None => {
                    seen.insert(id, path.clone());
                }
            }
        }
    }
    Ok(problems)
}
