// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Line scanner for the markdown subset used by AI analysis text.
//!
//! Recognised per line: `## ` and `### ` headings, `- `, `* ` and `N. `
//! bullets, `**bold**` spans inside any text, blank lines as spacers.
//! Everything else is a paragraph. There is no nesting and no construct
//! spans more than one line.

/// Run of text with uniform weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Bullet { marker: String, spans: Vec<Span> },
    Paragraph(Vec<Span>),
    Spacer,
}

pub fn parse(text: &str) -> Vec<Block> {
    text.lines().map(parse_line).collect()
}

fn parse_line(line: &str) -> Block {
    let line = line.trim_end();
    let trimmed = line.trim_start();

    if trimmed.is_empty() {
        return Block::Spacer;
    }
    if let Some(rest) = trimmed.strip_prefix("### ") {
        return Block::Heading {
            level: 3,
            text: plain(rest),
        };
    }
    if let Some(rest) = trimmed.strip_prefix("## ") {
        return Block::Heading {
            level: 2,
            text: plain(rest),
        };
    }
    if let Some(rest) = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
    {
        return Block::Bullet {
            marker: "-".to_string(),
            spans: spans(rest),
        };
    }
    if let Some((number, rest)) = numbered(trimmed) {
        return Block::Bullet {
            marker: format!("{number}."),
            spans: spans(rest),
        };
    }

    Block::Paragraph(spans(trimmed))
}

/// `"12. text"` -> `("12", "text")`.
fn numbered(line: &str) -> Option<(&str, &str)> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix(". ")?;
    Some((&line[..digits], rest))
}

/// Split on `**` markers. An unmatched trailing marker stays literal.
pub fn spans(text: &str) -> Vec<Span> {
    let pieces: Vec<&str> = text.split("**").collect();
    let balanced = pieces.len() % 2 == 1;
    let mut out: Vec<Span> = Vec::new();

    for (i, piece) in pieces.iter().enumerate() {
        let is_last = i == pieces.len() - 1;
        let (text, bold) = if !balanced && is_last {
            (format!("**{piece}"), false)
        } else {
            (piece.to_string(), i % 2 == 1)
        };
        if text.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(prev) if prev.bold == bold => prev.text.push_str(&text),
            _ => out.push(Span { text, bold }),
        }
    }
    out
}

fn plain(text: &str) -> String {
    text.replace("**", "").trim().to_string()
}
