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

//! Choosing the next card to show.

use std::fmt::Display;
use std::fmt::Formatter;

use crate::rng::RandomSource;
use crate::types::card::Card;
use crate::types::card_list::CardList;

/// Maximum relative jitter added to each weight.
const RANDOM_FACTOR: f64 = 0.2;
/// Weights are capped here so one card cannot crowd out the deck.
const MAX_WEIGHT: f64 = 9.0;
const BASE_WEIGHT: f64 = 1.0;
/// Above this many candidates, heaviest cards are walked first.
const SORT_THRESHOLD: usize = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionMode {
    /// Weighted-random, favouring cards answered wrong and rarely right.
    #[default]
    Random,
    /// Cycle through the deck in order.
    Next,
}

impl SelectionMode {
    pub fn toggled(self) -> Self {
        match self {
            SelectionMode::Random => SelectionMode::Next,
            SelectionMode::Next => SelectionMode::Random,
        }
    }
}

impl Display for SelectionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionMode::Random => write!(f, "random"),
            SelectionMode::Next => write!(f, "next"),
        }
    }
}

/// The result of asking for the next card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Index of the chosen card.
    Card(usize),
    /// No card other than the one on display exists.
    NoCandidate,
}

/// Choose the card to show after the current one.
///
/// `stats` returns the `(right, wrong)` counts of a card.
pub fn next_card(
    mode: SelectionMode,
    list: &mut CardList,
    stats: impl Fn(&Card) -> (u32, u32),
    rng: &mut dyn RandomSource,
) -> Selection {
    let candidates = list.candidates();
    if candidates.is_empty() {
        return Selection::NoCandidate;
    }
    let picked = match mode {
        SelectionMode::Random => {
            let weighted: Vec<(usize, f64)> = candidates
                .into_iter()
                .filter_map(|i| list.get(i).map(|card| (i, card)))
                .map(|(i, card)| {
                    let (right, wrong) = stats(card);
                    (i, weight(right, wrong, rng.next_f64()))
                })
                .collect();
            draw(weighted, rng)
        }
        SelectionMode::Next => list.next_index(),
    };
    match picked {
        Some(i) => Selection::Card(i),
        None => Selection::NoCandidate,
    }
}

/// The selection weight of a card. `jitter` is a uniform draw in `[0, 1)`.
pub fn weight(right: u32, wrong: u32, jitter: f64) -> f64 {
    let base = ((wrong as f64 + 1.0).ln() + BASE_WEIGHT) / (right as f64 + 1.0);
    (base * (1.0 + jitter * RANDOM_FACTOR)).min(MAX_WEIGHT)
}

/// Pick one entry with probability proportional to its weight.
///
/// Falls back to the first entry (the heaviest, for large decks) when
/// rounding leaves the draw unresolved.
pub fn draw(mut weighted: Vec<(usize, f64)>, rng: &mut dyn RandomSource) -> Option<usize> {
    if weighted.len() > SORT_THRESHOLD {
        weighted.sort_by(|a, b| b.1.total_cmp(&a.1));
    }
    let total: f64 = weighted.iter().map(|(_, w)| w).sum();
    let target = rng.next_f64() * total;
    let mut cumulative = 0.0;
    for (index, w) in weighted.iter() {
        cumulative += w;
        if target < cumulative {
            return Some(*index);
        }
    }
    weighted.first().map(|(index, _)| *index)
}
