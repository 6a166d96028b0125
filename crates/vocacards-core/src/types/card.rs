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

/// One vocabulary entry.
///
/// Cards are rebuilt from the source text on every parse. Two cards are the
/// "same" card across parses only if their derivatives are equal.
#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    /// The prompt term.
    derivative: String,
    /// The answer.
    explanation: String,
    /// Optional phonetic hint.
    transcription: Option<String>,
    /// In-memory fallback counters, used when no stat record exists.
    right_count: u32,
    wrong_count: u32,
}

impl Card {
    pub fn new(
        derivative: impl Into<String>,
        explanation: impl Into<String>,
        transcription: Option<String>,
    ) -> Self {
        Self {
            derivative: derivative.into(),
            explanation: explanation.into(),
            transcription,
            right_count: 0,
            wrong_count: 0,
        }
    }

    pub fn derivative(&self) -> &str {
        &self.derivative
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn transcription(&self) -> Option<&str> {
        self.transcription.as_deref()
    }

    pub fn right_count(&self) -> u32 {
        self.right_count
    }

    pub fn wrong_count(&self) -> u32 {
        self.wrong_count
    }

    pub fn set_counts(&mut self, right: u32, wrong: u32) {
        self.right_count = right;
        self.wrong_count = wrong;
    }

    /// Count one answer. An answer always zeroes the opposite tally.
    pub fn record(&mut self, is_right: bool) {
        if is_right {
            self.right_count = self.right_count.saturating_add(1);
            self.wrong_count = 0;
        } else {
            self.wrong_count = self.wrong_count.saturating_add(1);
            self.right_count = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_right_zeroes_wrong() {
        let mut card = Card::new("cat", "gato", None);
        card.set_counts(4, 3);
        card.record(true);
        assert_eq!(card.right_count(), 5);
        assert_eq!(card.wrong_count(), 0);
    }

    #[test]
    fn test_record_wrong_zeroes_right() {
        let mut card = Card::new("cat", "gato", Some("kæt".to_string()));
        card.set_counts(4, 3);
        card.record(false);
        assert_eq!(card.right_count(), 0);
        assert_eq!(card.wrong_count(), 4);
        assert_eq!(card.transcription(), Some("kæt"));
    }
}
