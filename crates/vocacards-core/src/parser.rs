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

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

use crate::types::card::Card;

/// Parse a deck leniently: lines that are not cards are skipped.
///
/// This never fails. Empty input yields an empty deck.
pub fn parse_cards(text: &str) -> Vec<Card> {
    let mut cards = Vec::new();
    for (line_num, line) in text.lines().enumerate() {
        match Line::read(line) {
            Line::Blank => {}
            Line::Entry(card) => cards.push(card),
            Line::Malformed(reason) => {
                log::debug!("Skipping line {}: {}", line_num + 1, reason.message());
            }
        }
    }
    cards
}

/// Parse a deck, failing on the first line that is not a card.
pub fn parse_cards_strict(text: &str) -> Result<Vec<Card>, CardParseError> {
    let mut cards = Vec::new();
    for (line_num, line) in text.lines().enumerate() {
        match Line::read(line) {
            Line::Blank => {}
            Line::Entry(card) => cards.push(card),
            Line::Malformed(reason) => {
                return Err(CardParseError {
                    reason,
                    line_num,
                    line: line.to_string(),
                });
            }
        }
    }
    Ok(cards)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Malformed {
    /// No `:` separating the prompt from the answer.
    MissingSeparator,
    /// Nothing before the `:`.
    EmptyDerivative,
    /// Nothing after the `:`.
    EmptyExplanation,
}

impl Malformed {
    fn message(self) -> &'static str {
        match self {
            Malformed::MissingSeparator => "missing ':' between word and explanation.",
            Malformed::EmptyDerivative => "missing word before ':'.",
            Malformed::EmptyExplanation => "missing explanation after ':'.",
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct CardParseError {
    pub reason: Malformed,
    /// Zero-based line number within the deck text.
    pub line_num: usize,
    pub line: String,
}

impl Display for CardParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: {} ({:?})",
            self.line_num + 1,
            self.reason.message(),
            self.line
        )
    }
}

impl Error for CardParseError {}

enum Line {
    Blank,
    /// A line like `word [transcription] : explanation`.
    Entry(Card),
    Malformed(Malformed),
}

impl Line {
    fn read(line: &str) -> Self {
        let line = strip_list_marker(line.trim());
        if line.is_empty() {
            return Line::Blank;
        }
        let Some((prompt, explanation)) = line.split_once(':') else {
            return Line::Malformed(Malformed::MissingSeparator);
        };
        let explanation = explanation.trim();
        let (derivative, transcription) = split_transcription(prompt.trim());
        if derivative.is_empty() {
            Line::Malformed(Malformed::EmptyDerivative)
        } else if explanation.is_empty() {
            Line::Malformed(Malformed::EmptyExplanation)
        } else {
            Line::Entry(Card::new(derivative, explanation, transcription))
        }
    }
}

fn strip_list_marker(line: &str) -> &str {
    for marker in ["- ", "* ", "+ "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return rest.trim_start();
        }
    }
    line
}

/// Split `word [transcription]` into its parts. Without a trailing bracket
/// group the whole prompt is the derivative.
fn split_transcription(prompt: &str) -> (&str, Option<String>) {
    if let Some(body) = prompt.strip_suffix(']') {
        if let Some(open) = body.rfind('[') {
            let transcription = body[open + 1..].trim();
            let derivative = body[..open].trim();
            if !derivative.is_empty() {
                let transcription = if transcription.is_empty() {
                    None
                } else {
                    Some(transcription.to_string())
                };
                return (derivative, transcription);
            }
        }
    }
    (prompt, None)
}
