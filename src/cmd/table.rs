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

use vocacards_core::Card;
use vocacards_core::Fallible;
use vocacards_core::Host;
use vocacards_core::block::deck_source;
use vocacards_core::block::sections;
use vocacards_core::parse_cards;

use crate::collection::Collection;

pub fn print_tables(directory: Option<String>, note: &str) -> Fallible<()> {
    let vault = Collection::new(directory)?.vault();
    let text = vault.read(note)?;
    let tables = render_tables(&text);
    if tables.is_empty() {
        println!("No vocabulary blocks in {note}.");
    }
    for table in tables {
        println!("{table}\n");
    }
    Ok(())
}

/// One plain-text table per vocabulary block of `text`.
fn render_tables(text: &str) -> Vec<String> {
    sections(text)
        .iter()
        .enumerate()
        .map(|(ordinal, section)| {
            let cards = parse_cards(&deck_source(text, section));
            let title = match section.header.id() {
                Some(id) => format!("Block {} ({id})", ordinal + 1),
                None => format!("Block {}", ordinal + 1),
            };
            format!("{title}\n{}", render_rows(&cards))
        })
        .collect()
}

fn render_rows(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "(no cards)".to_string();
    }
    let rows: Vec<[&str; 3]> = cards
        .iter()
        .map(|card| {
            [
                card.derivative(),
                card.transcription().unwrap_or(""),
                card.explanation(),
            ]
        })
        .collect();
    let width = |col: usize| {
        rows.iter()
            .map(|row| row[col].chars().count())
            .max()
            .unwrap_or(0)
    };
    let (first, second) = (width(0), width(1));
    rows.iter()
        .map(|row| match second {
            0 => format!("{}  {}", pad(row[0], first), row[2]),
            _ => format!("{}  {}  {}", pad(row[0], first), pad(row[1], second), row[2]),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.chars().count());
    format!("{s}{}", " ".repeat(fill))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::NOTE;
    use crate::helper::NOTE_TEXT;
    use crate::helper::create_sample_vault;

    #[test]
    fn test_render_tables() {
        let tables = render_tables(NOTE_TEXT);
        assert_eq!(tables.len(), 2);
        assert_eq!(
            tables[0],
            "Block 1\ncat  kæt  a small feline\ndog       a loyal canine"
        );
        assert_eq!(tables[1], "Block 2 (id:42)\nfern  a flowerless plant");
    }

    #[test]
    fn test_empty_block() {
        let tables = render_tables("```voca-card\n```\n");
        assert_eq!(tables, vec!["Block 1\n(no cards)".to_string()]);
    }

    #[test]
    fn test_print_tables() -> Fallible<()> {
        let dir = create_sample_vault()?;
        print_tables(Some(dir.clone()), NOTE)?;
        assert!(print_tables(Some(dir), "missing.md").is_err());
        Ok(())
    }
}
