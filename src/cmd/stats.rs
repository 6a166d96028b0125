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

use std::collections::BTreeSet;
use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;
use serde::Serialize;
use vocacards_core::BlockId;
use vocacards_core::Fallible;
use vocacards_core::Host;
use vocacards_core::Settings;
use vocacards_core::SettingsStore;
use vocacards_core::block::deck_source;
use vocacards_core::block::sections;
use vocacards_core::parse_cards;

use crate::collection::Collection;

#[derive(ValueEnum, Clone, Copy, PartialEq)]
pub enum StatsFormat {
    Text,
    Json,
}

impl Display for StatsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFormat::Text => write!(f, "text"),
            StatsFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Serialize)]
struct VaultStats {
    blocks: Vec<BlockStats>,
    /// Ids with stored stats but no block in the vault.
    orphans: Vec<BlockId>,
}

#[derive(Debug, PartialEq, Serialize)]
struct BlockStats {
    path: String,
    ordinal: usize,
    kind: String,
    id: Option<BlockId>,
    cards: usize,
    /// Cards with at least one recorded answer.
    answered: usize,
    right: u64,
    wrong: u64,
    /// Cards whose last answers were wrong.
    struggling: Vec<String>,
}

pub fn print_stats(directory: Option<String>, format: StatsFormat) -> Fallible<()> {
    let collection = Collection::new(directory)?;
    let settings = Settings::from_value(collection.store().load()?);
    let stats = collect_stats(&collection.vault(), &settings)?;
    match format {
        StatsFormat::Text => print!("{}", render_text(&stats)),
        StatsFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
    }
    Ok(())
}

fn collect_stats(vault: &dyn Host, settings: &Settings) -> Fallible<VaultStats> {
    let mut blocks = Vec::new();
    let mut live: BTreeSet<BlockId> = BTreeSet::new();
    for path in vault.documents()? {
        let text = match vault.read(&path) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Skipping {path}: {e}");
                continue;
            }
        };
        for (ordinal, section) in sections(&text).iter().enumerate() {
            let cards = parse_cards(&deck_source(&text, section));
            let id = section.header.id();
            let page = id.as_ref().and_then(|id| settings.stats.get(id));
            let mut block = BlockStats {
                path: path.clone(),
                ordinal,
                kind: section.header.kind.to_string(),
                id: id.clone(),
                cards: cards.len(),
                answered: 0,
                right: 0,
                wrong: 0,
                struggling: Vec::new(),
            };
            for card in &cards {
                let Some(record) = page.and_then(|page| page.get(card.derivative())) else {
                    continue;
                };
                block.answered += 1;
                block.right += u64::from(record.r);
                block.wrong += u64::from(record.w);
                if record.w > 0 {
                    block.struggling.push(card.derivative().to_string());
                }
            }
            if let Some(id) = id {
                live.insert(id);
            }
            blocks.push(block);
        }
    }
    let orphans = settings
        .stats
        .keys()
        .filter(|id| !live.contains(*id))
        .cloned()
        .collect();
    Ok(VaultStats { blocks, orphans })
}

fn render_text(stats: &VaultStats) -> String {
    let mut out = String::new();
    for block in &stats.blocks {
        let id = block.id.as_ref().map(|id| id.to_string()).unwrap_or("-".to_string());
        out.push_str(&format!(
            "{} #{} {} {id}: {} cards, {} answered, {} right, {} wrong\n",
            block.path,
            block.ordinal + 1,
            block.kind,
            block.cards,
            block.answered,
            block.right,
            block.wrong
        ));
        if !block.struggling.is_empty() {
            out.push_str(&format!("  struggling: {}\n", block.struggling.join(", ")));
        }
    }
    if !stats.orphans.is_empty() {
        out.push_str(&format!(
            "Stats of {} deleted blocks can be removed with `vocacards clean`.\n",
            stats.orphans.len()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use vocacards_core::MemoryVault;

    use super::*;
    use crate::helper::NOTE;
    use crate::helper::NOTE_TEXT;
    use crate::helper::create_sample_vault;

    fn sample() -> Fallible<VaultStats> {
        let mut vault = MemoryVault::new();
        vault.insert(NOTE, NOTE_TEXT);
        let settings = Settings::from_value(Some(json!({
            "stats": {
                "id:42": { "fern": { "r": 0, "w": 2 }, "gone": { "r": 5, "w": 0 } },
                "id:9": { "x": { "r": 1, "w": 0 } }
            }
        })));
        collect_stats(&vault, &settings)
    }

    #[test]
    fn test_collect_stats() -> Fallible<()> {
        let stats = sample()?;
        assert_eq!(stats.blocks.len(), 2);
        assert_eq!(stats.blocks[0].id, None);
        assert_eq!(stats.blocks[0].cards, 2);
        assert_eq!(stats.blocks[0].answered, 0);
        let table = &stats.blocks[1];
        assert_eq!(table.kind, "voca-table");
        assert_eq!(table.answered, 1);
        assert_eq!((table.right, table.wrong), (0, 2));
        assert_eq!(table.struggling, vec!["fern"]);
        assert_eq!(stats.orphans, vec![BlockId::from_millis(9)]);
        Ok(())
    }

    #[test]
    fn test_collect_stats_large_counts() -> Fallible<()> {
        let mut vault = MemoryVault::new();
        vault.insert(NOTE, "```voca-card id:5\n```\ncat: a feline\ndog: a canine\n");
        let settings = Settings::from_value(Some(json!({
            "stats": { "id:5": {
                "cat": { "r": u32::MAX, "w": u32::MAX },
                "dog": { "r": u32::MAX, "w": 1 }
            } }
        })));
        let stats = collect_stats(&vault, &settings)?;
        let block = &stats.blocks[0];
        assert_eq!(block.right, 2 * u64::from(u32::MAX));
        assert_eq!(block.wrong, u64::from(u32::MAX) + 1);
        Ok(())
    }

    #[test]
    fn test_render_text() -> Fallible<()> {
        let text = render_text(&sample()?);
        assert_eq!(
            text,
            "words.md #1 voca-card -: 2 cards, 0 answered, 0 right, 0 wrong\n\
             words.md #2 voca-table id:42: 1 cards, 1 answered, 0 right, 2 wrong\n  \
             struggling: fern\n\
             Stats of 1 deleted blocks can be removed with `vocacards clean`.\n"
        );
        Ok(())
    }

    #[test]
    fn test_print_stats() -> Fallible<()> {
        let dir = create_sample_vault()?;
        print_stats(Some(dir.clone()), StatsFormat::Text)?;
        print_stats(Some(dir), StatsFormat::Json)?;
        Ok(())
    }
}
