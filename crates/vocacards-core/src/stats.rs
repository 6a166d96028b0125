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

//! Per-block answer statistics and the identity that ties a block to them.

use std::collections::HashSet;

use crate::block::BlockRef;
use crate::block::block_ids;
use crate::block::locate;
use crate::block::stamp_id;
use crate::error::Fallible;
use crate::host::Clock;
use crate::host::Host;
use crate::host::find_section;
use crate::settings::Settings;
use crate::settings::SettingsStore;
use crate::types::block_id::BlockId;
use crate::types::card::Card;
use crate::types::card_list::CardList;
use crate::types::stat_record::StatRecord;

/// Mints block ids from the wall clock, strictly increasing within a
/// process.
#[derive(Default)]
pub struct IdMinter {
    last: Option<i64>,
}

impl IdMinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&mut self, clock: &dyn Clock) -> BlockId {
        let now = clock.now_millis();
        let millis = match self.last {
            Some(last) if now <= last => last + 1,
            _ => now,
        };
        self.last = Some(millis);
        BlockId::from_millis(millis)
    }
}

/// The stat store of one rendered block.
pub struct StatStore {
    block: BlockRef,
    id: Option<BlockId>,
}

impl StatStore {
    pub fn new(block: BlockRef) -> Self {
        Self { block, id: None }
    }

    pub fn block(&self) -> &BlockRef {
        &self.block
    }

    /// The id resolved by the last call to [`StatStore::resolve_id`].
    pub fn id(&self) -> Option<&BlockId> {
        self.id.as_ref()
    }

    /// Find the id of the block, stamping one into the document if the
    /// header has none.
    ///
    /// Returns `Ok(None)` if the block cannot be located. Once a header
    /// carries an id, calling this again reads it back without rewriting
    /// the document.
    pub fn resolve_id(
        &mut self,
        host: &mut dyn Host,
        minter: &mut IdMinter,
        clock: &dyn Clock,
    ) -> Fallible<Option<BlockId>> {
        let Some((_, section)) = find_section(&*host, &self.block) else {
            log::debug!("No section for block {} of {}", self.block.ordinal, self.block.path);
            return Ok(None);
        };
        if let Some(id) = section.header.id() {
            self.id = Some(id.clone());
            return Ok(Some(id));
        }

        let id = match self.id.take() {
            Some(id) => id,
            None => minter.mint(clock),
        };
        let ordinal = self.block.ordinal;
        let kind = section.header.kind;
        let mut stamped = false;
        host.process(&self.block.path, &mut |current: &str| match locate(current, ordinal) {
            Some(s) if s.header.kind == kind && s.header.id().is_none() => {
                stamped = true;
                stamp_id(current, &s, &id)
            }
            _ => current.to_string(),
        })?;

        if stamped {
            log::info!("Stamped {id} into {}", self.block.path);
            self.id = Some(id.clone());
            return Ok(Some(id));
        }
        // The header changed under us: take whatever it says now.
        self.id = find_section(&*host, &self.block).and_then(|(_, s)| s.header.id());
        Ok(self.id.clone())
    }

    /// The `(right, wrong)` counts of a card, falling back to the card's own
    /// counters when nothing is stored for it.
    pub fn get_stats(&self, settings: &Settings, card: &Card) -> (u32, u32) {
        self.id
            .as_ref()
            .and_then(|id| settings.stats.get(id))
            .and_then(|page| page.get(card.derivative()))
            .map(|record| record.pair())
            .unwrap_or((card.right_count(), card.wrong_count()))
    }

    /// Load stored counts into the cards' own counters.
    pub fn hydrate(&self, settings: &Settings, list: &mut CardList) {
        let Some(page) = self.id.as_ref().and_then(|id| settings.stats.get(id)) else {
            return;
        };
        for card in list.cards_mut() {
            if let Some(record) = page.get(card.derivative()) {
                card.set_counts(record.r, record.w);
            }
        }
    }

    /// Count an answer for `card` and persist it.
    ///
    /// The settings are updated in memory first; a failed save is returned
    /// to the caller.
    pub fn record_answer(
        &self,
        settings: &mut Settings,
        store: &mut dyn SettingsStore,
        card: &mut Card,
        is_right: bool,
    ) -> Fallible<()> {
        card.record(is_right);
        let Some(id) = &self.id else {
            log::warn!("Block {} has no id; answer kept in memory only", self.block.ordinal);
            return Ok(());
        };
        settings.stats.entry(id.clone()).or_default().insert(
            card.derivative().to_string(),
            StatRecord::new(card.right_count(), card.wrong_count()),
        );
        store.save(settings)
    }

    /// Drop stat records of derivatives no longer in the deck. Returns how
    /// many were dropped.
    pub fn cleanup_saved_stats(
        &self,
        settings: &mut Settings,
        store: &mut dyn SettingsStore,
        list: &CardList,
    ) -> Fallible<usize> {
        let Some(page) = self.id.as_ref().and_then(|id| settings.stats.get_mut(id)) else {
            return Ok(0);
        };
        let live: HashSet<&str> = list.derivatives();
        let before = page.len();
        page.retain(|derivative, _| live.contains(derivative.as_str()));
        let removed = before - page.len();
        if removed > 0 {
            log::debug!("Pruned {removed} stale stat records of {}", self.block.path);
            store.save(settings)?;
        }
        Ok(removed)
    }
}

/// What a corpus sweep did.
#[derive(Debug, Default, PartialEq)]
pub struct SweepReport {
    /// Ids whose stats were deleted.
    pub removed: Vec<BlockId>,
    /// Documents that could not be read.
    pub unreadable: Vec<String>,
}

/// Delete the stats of every block id that no document mentions anymore.
///
/// A document that cannot be read is skipped; the sweep carries on.
pub fn sweep_stats(
    host: &dyn Host,
    settings: &mut Settings,
    store: &mut dyn SettingsStore,
) -> Fallible<SweepReport> {
    let mut report = SweepReport::default();
    let mut live: HashSet<BlockId> = HashSet::new();
    for path in host.documents()? {
        match host.read(&path) {
            Ok(text) => live.extend(block_ids(&text)),
            Err(e) => {
                log::warn!("Skipping {path} during stats sweep: {e}");
                report.unreadable.push(path);
            }
        }
    }
    report.removed = settings
        .stats
        .keys()
        .filter(|id| !live.contains(*id))
        .cloned()
        .collect();
    if report.removed.is_empty() {
        return Ok(report);
    }
    for id in &report.removed {
        settings.stats.remove(id);
    }
    log::info!("Removed stats of {} unused blocks", report.removed.len());
    store.save(settings)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::host::FixedClock;
    use crate::host::MemoryVault;
    use crate::settings::MemoryStore;
    use crate::types::stat_record::PageStats;

    const NOTE: &str = "```voca-card\n```\ncat: gato\ndog: perro\n";

    fn vault(text: &str) -> MemoryVault {
        let mut vault = MemoryVault::new();
        vault.insert("note.md", text);
        vault
    }

    fn resolved(vault: &mut MemoryVault) -> Fallible<StatStore> {
        let mut stats = StatStore::new(BlockRef::new("note.md", 0));
        stats.resolve_id(vault, &mut IdMinter::new(), &FixedClock(1000))?;
        Ok(stats)
    }

    #[test]
    fn test_minter_is_monotonic() {
        let mut minter = IdMinter::new();
        let clock = FixedClock(50);
        assert_eq!(minter.mint(&clock), BlockId::from_millis(50));
        assert_eq!(minter.mint(&clock), BlockId::from_millis(51));
        assert_eq!(minter.mint(&FixedClock(10)), BlockId::from_millis(52));
        assert_eq!(minter.mint(&FixedClock(90)), BlockId::from_millis(90));
    }

    #[test]
    fn test_resolve_id_stamps_once() -> Fallible<()> {
        let mut vault = vault(NOTE);
        let mut stats = StatStore::new(BlockRef::new("note.md", 0));
        let mut minter = IdMinter::new();
        let first = stats.resolve_id(&mut vault, &mut minter, &FixedClock(1000))?;
        let second = stats.resolve_id(&mut vault, &mut minter, &FixedClock(2000))?;
        assert_eq!(first, Some(BlockId::from_millis(1000)));
        assert_eq!(first, second);
        assert_eq!(vault.writes(), 1);
        assert_eq!(
            vault.get("note.md"),
            Some("```voca-card id:1000\n```\ncat: gato\ndog: perro\n")
        );
        Ok(())
    }

    #[test]
    fn test_resolve_id_reads_existing() -> Fallible<()> {
        let mut vault = vault("```voca-table my-deck\n```\ncat: gato");
        let stats = resolved(&mut vault)?;
        assert_eq!(stats.id().map(|id| id.as_str()), Some("my-deck"));
        assert_eq!(vault.writes(), 0);
        Ok(())
    }

    #[test]
    fn test_resolve_id_without_section() -> Fallible<()> {
        let mut vault = vault("no blocks here");
        let mut stats = StatStore::new(BlockRef::new("note.md", 0));
        let id = stats.resolve_id(&mut vault, &mut IdMinter::new(), &FixedClock(1))?;
        assert_eq!(id, None);
        let mut stats = StatStore::new(BlockRef::new("missing.md", 0));
        let id = stats.resolve_id(&mut vault, &mut IdMinter::new(), &FixedClock(1))?;
        assert_eq!(id, None);
        assert_eq!(vault.writes(), 0);
        Ok(())
    }

    #[test]
    fn test_resolve_id_follows_header_edits() -> Fallible<()> {
        let mut vault = vault(NOTE);
        let mut stats = resolved(&mut vault)?;
        vault.insert("note.md", "```voca-card renamed\n```\ncat: gato\n");
        let id = stats.resolve_id(&mut vault, &mut IdMinter::new(), &FixedClock(5))?;
        assert_eq!(id.map(|id| id.to_string()), Some("renamed".to_string()));
        Ok(())
    }

    #[test]
    fn test_get_stats_falls_back_to_card() -> Fallible<()> {
        let mut vault = vault(NOTE);
        let stats = resolved(&mut vault)?;
        let mut settings = Settings::default();
        let mut card = Card::new("cat", "gato", None);
        card.set_counts(2, 1);
        assert_eq!(stats.get_stats(&settings, &card), (2, 1));
        settings.stats.insert(
            BlockId::from_millis(1000),
            PageStats::from([("cat".to_string(), StatRecord::new(7, 0))]),
        );
        assert_eq!(stats.get_stats(&settings, &card), (7, 0));
        Ok(())
    }

    #[test]
    fn test_wrong_three_times_then_right() -> Fallible<()> {
        let mut vault = vault(NOTE);
        let stats = resolved(&mut vault)?;
        let mut settings = Settings::default();
        let mut store = MemoryStore::new();
        let mut list = CardList::from_source("cat: gato\ndog: perro");
        for _ in 0..3 {
            stats.record_answer(&mut settings, &mut store, &mut list.cards_mut()[0], false)?;
        }
        assert_eq!(
            settings.stats[&BlockId::from_millis(1000)]["cat"],
            StatRecord::new(0, 3)
        );
        stats.record_answer(&mut settings, &mut store, &mut list.cards_mut()[0], true)?;
        assert_eq!(
            settings.stats[&BlockId::from_millis(1000)]["cat"],
            StatRecord::new(1, 0)
        );
        assert_eq!(store.saves(), 4);
        assert_eq!(
            store.stored().map(|v| v["stats"]["id:1000"]["cat"].clone()),
            Some(json!({ "r": 1, "w": 0 }))
        );
        Ok(())
    }

    #[test]
    fn test_record_answer_failed_save() -> Fallible<()> {
        let mut vault = vault(NOTE);
        let stats = resolved(&mut vault)?;
        let mut settings = Settings::default();
        let mut store = MemoryStore::new();
        store.set_failing(true);
        let mut card = Card::new("cat", "gato", None);
        assert!(stats.record_answer(&mut settings, &mut store, &mut card, true).is_err());
        assert_eq!(card.right_count(), 1);
        assert_eq!(stats.get_stats(&settings, &card), (1, 0));
        Ok(())
    }

    #[test]
    fn test_hydrate() -> Fallible<()> {
        let mut vault = vault(NOTE);
        let stats = resolved(&mut vault)?;
        let mut settings = Settings::default();
        settings.stats.insert(
            BlockId::from_millis(1000),
            PageStats::from([("dog".to_string(), StatRecord::new(0, 4))]),
        );
        let mut list = CardList::from_source("cat: gato\ndog: perro");
        stats.hydrate(&settings, &mut list);
        assert_eq!(list.cards()[1].wrong_count(), 4);
        assert_eq!(list.cards()[0].wrong_count(), 0);
        Ok(())
    }

    #[test]
    fn test_cleanup_removes_exactly_stale_keys() -> Fallible<()> {
        let mut vault = vault(NOTE);
        let stats = resolved(&mut vault)?;
        let id = BlockId::from_millis(1000);
        let other = BlockId::from_millis(1);
        let mut settings = Settings::default();
        settings.stats.insert(
            id.clone(),
            PageStats::from([
                ("cat".to_string(), StatRecord::new(3, 0)),
                ("dog".to_string(), StatRecord::new(0, 2)),
                ("fish".to_string(), StatRecord::new(1, 0)),
            ]),
        );
        settings.stats.insert(
            other.clone(),
            PageStats::from([("fish".to_string(), StatRecord::new(5, 5))]),
        );
        let before = serde_json::to_string(&settings.stats[&id]["cat"])?;
        let mut store = MemoryStore::new();
        let list = CardList::from_source("cat: gato\ndog: perro");
        let removed = stats.cleanup_saved_stats(&mut settings, &mut store, &list)?;
        assert_eq!(removed, 1);
        let keys: Vec<&String> = settings.stats[&id].keys().collect();
        assert_eq!(keys, vec!["cat", "dog"]);
        assert_eq!(serde_json::to_string(&settings.stats[&id]["cat"])?, before);
        assert_eq!(settings.stats[&other].len(), 1);
        assert_eq!(store.saves(), 1);
        // Nothing left to prune: no further save.
        stats.cleanup_saved_stats(&mut settings, &mut store, &list)?;
        assert_eq!(store.saves(), 1);
        Ok(())
    }

    #[test]
    fn test_sweep() -> Fallible<()> {
        let mut vault = MemoryVault::new();
        vault.insert("a.md", "```voca-card A\n```\ncat: gato\n");
        vault.insert("b.md", "```voca-table\n```\ndog: perro\n");
        let mut settings = Settings::default();
        for id in ["A", "B"] {
            settings.stats.insert(
                BlockId::parse(id).unwrap(),
                PageStats::from([("cat".to_string(), StatRecord::new(1, 0))]),
            );
        }
        let mut store = MemoryStore::new();
        let report = sweep_stats(&vault, &mut settings, &mut store)?;
        assert_eq!(report.removed, vec![BlockId::parse("B").unwrap()]);
        let ids: Vec<&str> = settings.stats.keys().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["A"]);
        assert_eq!(store.saves(), 1);
        Ok(())
    }

    #[test]
    fn test_sweep_skips_unreadable_documents() -> Fallible<()> {
        let mut vault = MemoryVault::new();
        vault.insert("a.md", "```voca-card A\n```\n");
        vault.insert("broken.md", "```voca-card C\n```\n");
        vault.mark_unreadable("broken.md");
        let mut settings = Settings::default();
        settings.stats.insert(BlockId::parse("A").unwrap(), PageStats::new());
        let mut store = MemoryStore::new();
        let report = sweep_stats(&vault, &mut settings, &mut store)?;
        assert_eq!(report.unreadable, vec!["broken.md".to_string()]);
        assert!(report.removed.is_empty());
        assert_eq!(store.saves(), 0);
        Ok(())
    }
}
