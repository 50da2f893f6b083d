//! Role classification: headings, list items and emphasis.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Block, Emphasis, Paragraph};
use crate::render::cleanup::{clean_text, join_lines, CleanupOptions};

use super::{FontStatistics, LayoutConfig};

static RE_LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*([•●○▪▸►\-‐–—*]|\d+[.)]\s|[a-z][.)]\s)").unwrap());
static RE_ORDERED_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)[.)]").unwrap());

/// A list marker found at the start of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMarker {
    /// True for numeric markers
    pub ordered: bool,
    /// The number of an ordered marker
    pub number: Option<u32>,
    /// Text after the marker
    pub content: String,
}

/// Check if a line starts with a list marker.
pub fn is_list_line(text: &str) -> bool {
    RE_LIST_MARKER.is_match(text)
}

/// Split a list marker off the start of a line.
///
/// If nothing follows the marker the whole line is kept as content.
pub fn parse_list_marker(text: &str) -> Option<ListMarker> {
    let found = RE_LIST_MARKER.find(text)?;
    let marker = found.as_str().trim();
    let rest = text[found.end()..].trim();

    let number = RE_ORDERED_MARKER
        .captures(marker)
        .and_then(|caps| caps[1].parse::<u32>().ok());
    let ordered = RE_ORDERED_MARKER.is_match(marker);

    let content = if rest.is_empty() { text.trim() } else { rest };

    Some(ListMarker {
        ordered,
        number,
        content: content.to_string(),
    })
}

/// Assign a role to every paragraph of a page.
pub fn classify_page(
    paragraphs: &[Paragraph],
    stats: &FontStatistics,
    config: &LayoutConfig,
    cleanup: &CleanupOptions,
) -> Vec<Block> {
    paragraphs
        .iter()
        .filter_map(|p| classify_paragraph(p, stats, config, cleanup))
        .collect()
}

/// Classify one paragraph.
///
/// Checked in order: size-based heading, list item, bold body-sized heading,
/// then body text with optional emphasis. Returns `None` when nothing is left
/// after cleanup.
pub fn classify_paragraph(
    paragraph: &Paragraph,
    stats: &FontStatistics,
    config: &LayoutConfig,
    cleanup: &CleanupOptions,
) -> Option<Block> {
    let line_texts: Vec<&str> = paragraph.lines.iter().map(|l| l.text.as_str()).collect();
    let text = join_lines(&line_texts, cleanup);
    if text.is_empty() {
        return None;
    }

    let first = paragraph.first_line();
    let line_count = paragraph.line_count();
    let char_count = text.chars().count();

    if line_count <= config.max_heading_lines
        && stats.is_heading_size(first.font_size)
        && char_count <= config.max_heading_chars
    {
        let level = stats.heading_level(first.font_size);
        log::trace!("heading H{} at size {}: {}", level, first.font_size, text);
        return Some(Block::heading(text, level));
    }

    if let Some(marker) = parse_list_marker(&first.text) {
        let continuation = paragraph.lines[1..]
            .iter()
            .map(|l| clean_text(&l.text, cleanup))
            .filter(|t| !t.is_empty())
            .collect();
        return Some(Block::ListItem {
            ordered: marker.ordered,
            number: marker.number,
            text: clean_text(&marker.content, cleanup),
            continuation,
        });
    }

    if line_count == 1
        && first.is_bold
        && first.font_size >= stats.body_size
        && char_count < config.bold_heading_max_chars
        && !text.ends_with(['.', ',', ';'])
    {
        return Some(Block::heading(text, 3));
    }

    let emphasis = if line_count == 1 && first.is_bold && char_count < config.bold_emphasis_max_chars
    {
        Emphasis::Bold
    } else if line_count <= config.italic_max_lines && paragraph.is_italic() {
        Emphasis::Italic
    } else {
        Emphasis::None
    };

    Some(Block::Paragraph { text, emphasis })
}
