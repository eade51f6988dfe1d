//! Markdown chapter import.
//!
//! # Responsibility
//! - Convert plain markdown chapter files into note content blocks.
//!
//! # Invariants
//! - Every returned block passes `ContentBlock::validate()`.
//! - Unrecognized lines degrade to paragraphs; nothing is dropped except
//!   blank lines.

use crate::model::block::{ContentBlock, InlineRun, InlineStyle};
use once_cell::sync::Lazy;
use regex::Regex;

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(\S.*)$").expect("valid heading regex"));
static BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-*+]\s+(.*)$").expect("valid bullet regex"));
static NUMBERED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[.)]\s+(.*)$").expect("valid numbered regex"));
static DISPLAY_MATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$\$([^$]+)\$\$$").expect("valid display math regex"));
static INLINE_MATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$([^$]+)\$$").expect("valid inline math regex"));
static IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^!\[[^\]]*]\(([^)\s]+)\)$").expect("valid image regex"));
static INLINE_SPAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*(.+?)\*\*|__(.+?)__|\*(.+?)\*|`([^`]+)`").expect("valid inline span regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bullet,
    Numbered,
}

/// Parses markdown text into content blocks.
///
/// Consecutive list lines of one kind form a single list block; consecutive
/// plain lines join into one paragraph.
pub fn parse_blocks(text: &str) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    let mut list: Option<(ListKind, Vec<String>)> = None;
    let mut paragraph: Vec<&str> = Vec::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();

        let list_item = if let Some(caps) = BULLET_RE.captures(line) {
            Some((ListKind::Bullet, caps[1].trim().to_string()))
        } else {
            NUMBERED_RE
                .captures(line)
                .map(|caps| (ListKind::Numbered, caps[1].trim().to_string()))
        };
        if let Some((kind, item)) = list_item {
            match list.as_mut() {
                Some((current, items)) if *current == kind => items.push(item),
                _ => {
                    flush_paragraph(&mut paragraph, &mut blocks);
                    flush_list(&mut list, &mut blocks);
                    list = Some((kind, vec![item]));
                }
            }
            continue;
        }
        flush_list(&mut list, &mut blocks);

        if line.is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
            continue;
        }

        if let Some(block) = parse_standalone_line(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(block);
            continue;
        }

        paragraph.push(line);
    }

    flush_paragraph(&mut paragraph, &mut blocks);
    flush_list(&mut list, &mut blocks);
    blocks
}

/// Splits one paragraph line into styled runs.
pub fn parse_inline_runs(text: &str) -> Vec<InlineRun> {
    let mut runs = Vec::new();
    let mut cursor = 0;
    for caps in INLINE_SPAN_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > cursor {
            runs.push(InlineRun::plain(&text[cursor..whole.start()]));
        }

        let mut style = InlineStyle::default();
        let inner = if let Some(bold) = caps.get(1) {
            style.bold = true;
            bold.as_str()
        } else if let Some(underline) = caps.get(2) {
            style.underline = true;
            underline.as_str()
        } else if let Some(italic) = caps.get(3) {
            style.italic = true;
            italic.as_str()
        } else if let Some(code) = caps.get(4) {
            style.code = true;
            code.as_str()
        } else {
            whole.as_str()
        };
        runs.push(InlineRun::styled(inner, style));
        cursor = whole.end();
    }
    if cursor < text.len() {
        runs.push(InlineRun::plain(&text[cursor..]));
    }
    runs
}

fn parse_standalone_line(line: &str) -> Option<ContentBlock> {
    if let Some(caps) = HEADING_RE.captures(line) {
        return Some(ContentBlock::heading(
            caps[1].len() as u8,
            caps[2].trim(),
        ));
    }
    if let Some(caps) = IMAGE_RE.captures(line) {
        return Some(ContentBlock::image(&caps[1]));
    }
    let math = DISPLAY_MATH_RE
        .captures(line)
        .or_else(|| INLINE_MATH_RE.captures(line))
        .map(|caps| caps[1].trim().to_string())
        .filter(|expression| !expression.is_empty());
    math.map(ContentBlock::math)
}

fn flush_paragraph(lines: &mut Vec<&str>, blocks: &mut Vec<ContentBlock>) {
    if lines.is_empty() {
        return;
    }
    let joined = lines.join(" ");
    lines.clear();
    let runs = parse_inline_runs(&joined);
    if !runs.is_empty() {
        blocks.push(ContentBlock::Paragraph { runs });
    }
}

fn flush_list(list: &mut Option<(ListKind, Vec<String>)>, blocks: &mut Vec<ContentBlock>) {
    if let Some((kind, items)) = list.take() {
        blocks.push(match kind {
            ListKind::Bullet => ContentBlock::BulletList { items },
            ListKind::Numbered => ContentBlock::NumberedList { items },
        });
    }
}
