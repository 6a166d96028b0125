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

//! Code fences that hold vocabulary blocks.
//!
//! A block opens with a line like ```` ```voca-card id:1718000000000 ````.
//! The block body itself is unused: the deck is the text that follows the
//! closing fence, up to the next vocabulary block.

use std::fmt::Display;
use std::fmt::Formatter;

use crate::types::block_id::BlockId;

pub const CARD_KEYWORD: &str = "voca-card";
pub const TABLE_KEYWORD: &str = "voca-table";

/// The minimum number of backticks in a fence.
const MIN_FENCE: usize = 3;

/// How a block is rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Card,
    Table,
}

impl BlockKind {
    pub fn keyword(self) -> &'static str {
        match self {
            BlockKind::Card => CARD_KEYWORD,
            BlockKind::Table => TABLE_KEYWORD,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            BlockKind::Card => BlockKind::Table,
            BlockKind::Table => BlockKind::Card,
        }
    }

    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            CARD_KEYWORD => Some(BlockKind::Card),
            TABLE_KEYWORD => Some(BlockKind::Table),
            _ => None,
        }
    }
}

impl Display for BlockKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// Addresses a block: the `ordinal`-th vocabulary block of a document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockRef {
    pub path: String,
    pub ordinal: usize,
}

impl BlockRef {
    pub fn new(path: impl Into<String>, ordinal: usize) -> Self {
        Self {
            path: path.into(),
            ordinal,
        }
    }
}

/// The opening line of a vocabulary block.
#[derive(Clone, Debug, PartialEq)]
pub struct FenceHeader {
    /// Number of backticks.
    pub fence: usize,
    pub kind: BlockKind,
    /// Everything after the keyword, trimmed.
    pub attributes: String,
}

impl FenceHeader {
    pub fn id(&self) -> Option<BlockId> {
        BlockId::parse(&self.attributes)
    }
}

/// Parse a line as a vocabulary fence header.
pub fn parse_header(line: &str) -> Option<FenceHeader> {
    let line = line.trim();
    let fence = count_backticks(line);
    if fence < MIN_FENCE {
        return None;
    }
    let rest = &line[fence..];
    let (word, attributes) = match rest.find(char::is_whitespace) {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, ""),
    };
    let kind = BlockKind::from_keyword(word)?;
    Some(FenceHeader {
        fence,
        kind,
        attributes: attributes.trim().to_string(),
    })
}

/// A located block: the line range of its fence, both ends inclusive.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub line_start: usize,
    pub line_end: usize,
    pub header: FenceHeader,
}

/// Every vocabulary block in a document, in order.
///
/// Fences of other languages are stepped over, so a vocabulary keyword
/// quoted inside another code block is not a block.
pub fn sections(text: &str) -> Vec<Section> {
    let lines: Vec<&str> = text.lines().collect();
    let mut found = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let fence = count_backticks(lines[i].trim());
        if fence < MIN_FENCE {
            i += 1;
            continue;
        }
        let end = closing_fence(&lines, i, fence);
        if let Some(header) = parse_header(lines[i]) {
            found.push(Section {
                line_start: i,
                line_end: end,
                header,
            });
        }
        i = end + 1;
    }
    found
}

/// Locate the `ordinal`-th vocabulary block of a document.
pub fn locate(text: &str, ordinal: usize) -> Option<Section> {
    sections(text).into_iter().nth(ordinal)
}

/// Every block id stamped into a document.
pub fn block_ids(text: &str) -> Vec<BlockId> {
    sections(text)
        .into_iter()
        .filter_map(|section| section.header.id())
        .collect()
}

/// The deck text of a block: the lines after its closing fence up to the
/// next vocabulary block, without Markdown headings.
pub fn deck_source(text: &str, section: &Section) -> String {
    let lines: Vec<&str> = text
        .lines()
        .skip(section.line_end + 1)
        .take_while(|line| parse_header(line).is_none())
        .filter(|line| !is_heading(line))
        .collect();
    lines.join("\n").trim().to_string()
}

/// Append `id` to the header line of `section`.
pub fn stamp_id(text: &str, section: &Section, id: &BlockId) -> String {
    replace_line(text, section.line_start, |line| {
        format!("{} {}", line.trim(), id)
    })
}

/// Swap the block keyword of `section` between card and table.
pub fn switch_kind(text: &str, section: &Section) -> String {
    let from = section.header.kind.keyword();
    let to = section.header.kind.toggled().keyword();
    replace_line(text, section.line_start, |line| line.replacen(from, to, 1))
}

fn count_backticks(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b'`').count()
}

/// Index of the line closing the fence opened at `open`. An unterminated
/// fence runs to the end of the document.
fn closing_fence(lines: &[&str], open: usize, fence: usize) -> usize {
    for (i, line) in lines.iter().enumerate().skip(open + 1) {
        let line = line.trim();
        let n = count_backticks(line);
        if n >= fence && n == line.len() {
            return i;
        }
    }
    lines.len().saturating_sub(1).max(open)
}

fn is_heading(line: &str) -> bool {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    (1..=6).contains(&hashes) && line[hashes..].starts_with(char::is_whitespace)
}

/// Rewrite one line, leaving every other byte of the text untouched.
fn replace_line(text: &str, index: usize, f: impl FnOnce(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len() + 32);
    let mut f = Some(f);
    for (i, chunk) in text.split_inclusive('\n').enumerate() {
        if i == index {
            let body = chunk.trim_end_matches(['\n', '\r']);
            let ending = &chunk[body.len()..];
            if let Some(f) = f.take() {
                out.push_str(&f(body));
            }
            out.push_str(ending);
        } else {
            out.push_str(chunk);
        }
    }
    out
}
