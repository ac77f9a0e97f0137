//! The Markdown subset used in action-item content.
//!
//! Only `**bold**` and pipe tables are recognized. Everything else is plain
//! text, one block per line.

use crate::patterns::{RE_MD_BOLD, RE_MD_TABLE_SEPARATOR};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Bold(String),
}

pub type Cell = Vec<Span>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// One source line. Empty for blank lines.
    Line(Vec<Span>),
    Table { header: Vec<Cell>, rows: Vec<Vec<Cell>> },
}

pub fn parse(content: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut table_lines: Vec<&str> = Vec::new();

    for line in content.lines() {
        if is_table_line(line) {
            table_lines.push(line.trim());
            continue;
        }
        flush_table(&mut table_lines, &mut blocks);
        blocks.push(Block::Line(inline(line)));
    }
    flush_table(&mut table_lines, &mut blocks);
    blocks
}

fn is_table_line(line: &str) -> bool {
    let line = line.trim();
    line.len() >= 2 && line.starts_with('|') && line.ends_with('|')
}

fn flush_table(lines: &mut Vec<&str>, blocks: &mut Vec<Block>) {
    let mut rows = lines
        .drain(..)
        .filter(|line| !RE_MD_TABLE_SEPARATOR.is_match(line))
        .map(split_cells);
    if let Some(header) = rows.next() {
        blocks.push(Block::Table {
            header,
            rows: rows.collect(),
        });
    }
}

fn split_cells(line: &str) -> Vec<Cell> {
    line[1..line.len() - 1]
        .split('|')
        .map(|cell| inline(cell.trim()))
        .collect()
}

/// Splits a line into text and bold spans.
pub fn inline(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last = 0;
    for captures in RE_MD_BOLD.captures_iter(text) {
        let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if whole.start() > last {
            spans.push(Span::Text(text[last..whole.start()].to_string()));
        }
        spans.push(Span::Bold(inner.as_str().to_string()));
        last = whole.end();
    }
    if last < text.len() {
        spans.push(Span::Text(text[last..].to_string()));
    }
    spans
}

/// Flattens spans back to plain text, dropping emphasis.
pub fn plain(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Text(text) | Span::Bold(text) => text.as_str(),
        })
        .collect()
}
