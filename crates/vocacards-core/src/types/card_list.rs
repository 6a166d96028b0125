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

use std::collections::HashSet;

use crate::parser::parse_cards;
use crate::types::card::Card;

/// The ordered deck of one block, with the card on display and the cursor
/// used by sequential selection.
#[derive(Clone, Debug, Default)]
pub struct CardList {
    cards: Vec<Card>,
    /// Index of the card currently displayed.
    current: Option<usize>,
    /// Index of the card last picked by sequential selection.
    cursor: Option<usize>,
}

impl CardList {
    pub fn new(cards: Vec<Card>) -> Self {
        Self {
            cards,
            current: None,
            cursor: None,
        }
    }

    /// Parse a deck from block source text.
    pub fn from_source(text: &str) -> Self {
        Self::new(parse_cards(text))
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn cards_mut(&mut self) -> &mut [Card] {
        &mut self.cards
    }

    pub fn get(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&Card> {
        self.current.and_then(|i| self.cards.get(i))
    }

    pub fn set_current(&mut self, index: Option<usize>) {
        self.current = index.filter(|i| *i < self.cards.len());
    }

    /// Indices of every card except the one on display.
    pub fn candidates(&self) -> Vec<usize> {
        (0..self.cards.len())
            .filter(|i| Some(*i) != self.current)
            .collect()
    }

    /// The set of derivatives in the deck.
    pub fn derivatives(&self) -> HashSet<&str> {
        self.cards.iter().map(|c| c.derivative()).collect()
    }

    /// Advance the sequential cursor, wrapping at the end and stepping over
    /// the card on display. Returns `None` when no other card exists.
    pub fn next_index(&mut self) -> Option<usize> {
        let len = self.cards.len();
        if len == 0 {
            return None;
        }
        let mut next = match self.cursor {
            Some(c) => (c + 1) % len,
            None => 0,
        };
        if Some(next) == self.current {
            next = (next + 1) % len;
        }
        if Some(next) == self.current {
            return None;
        }
        self.cursor = Some(next);
        Some(next)
    }

    /// Replace the deck with a fresh parse of `text`.
    ///
    /// The displayed card and the cursor follow their derivatives into the
    /// new deck. Cards that survive keep their in-memory counters.
    pub fn update_source(&mut self, text: &str) {
        let mut cards = parse_cards(text);
        for card in cards.iter_mut() {
            if let Some(old) = self.find(card.derivative()) {
                card.set_counts(old.right_count(), old.wrong_count());
            }
        }
        let position = |derivative: &str| cards.iter().position(|c| c.derivative() == derivative);
        let current = self
            .current()
            .and_then(|card| position(card.derivative()));
        let cursor = match self.cursor.and_then(|i| self.cards.get(i)) {
            Some(card) => match position(card.derivative()) {
                Some(i) => Some(i),
                None if cards.is_empty() => None,
                None => self.cursor.map(|c| c.min(cards.len() - 1)),
            },
            None => None,
        };
        self.cards = cards;
        self.current = current;
        self.cursor = cursor;
    }

    fn find(&self, derivative: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.derivative() == derivative)
    }
}
