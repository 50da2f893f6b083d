//! Visual lines assembled from text items.

use std::collections::BTreeMap;

use serde::Serialize;

use super::TextItem;

/// A text line composed of items sharing one visual row.
#[derive(Debug, Clone, Serialize)]
pub struct Line {
    /// The items in this line, sorted by X position
    pub items: Vec<TextItem>,
    /// Row position, taken from the item that anchored the line
    pub y: f32,
    /// Leftmost X position
    pub x: f32,
    /// Items joined with inferred word spaces
    pub text: String,
    /// Dominant font size, weighted by character count
    pub font_size: f32,
    /// True if any item is bold
    pub is_bold: bool,
    /// True only if every item is italic
    pub is_italic: bool,
}

impl Line {
    /// Build a line from the items of one row.
    ///
    /// `anchor_y` is the y of the first item encountered for the row;
    /// `word_gap_factor` is the fraction of the trailing item's font size a
    /// horizontal gap must exceed to be read as a word space.
    pub fn from_items(mut items: Vec<TextItem>, anchor_y: f32, word_gap_factor: f32) -> Self {
        items.sort_by(|a, b| a.x.total_cmp(&b.x));

        let text = join_items(&items, word_gap_factor);
        let font_size = dominant_font_size(&items);
        let is_bold = items.iter().any(|i| i.is_bold);
        let is_italic = !items.is_empty() && items.iter().all(|i| i.is_italic);
        let x = items.first().map(|i| i.x).unwrap_or(0.0);

        Self {
            items,
            y: anchor_y,
            x,
            text,
            font_size,
            is_bold,
            is_italic,
        }
    }

    /// Number of characters in the joined text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Check if the line carries no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Dominant size of a set of items by character-count weighting.
///
/// Ties go to the larger size so the result never depends on input order.
pub fn dominant_font_size(items: &[TextItem]) -> f32 {
    let mut weights: BTreeMap<i32, usize> = BTreeMap::new();
    for item in items {
        *weights.entry(size_key(item.font_size)).or_insert(0) += item.char_count();
    }

    // BTreeMap iterates ascending, so `max_by_key` keeps the last (largest) key on ties.
    weights
        .into_iter()
        .max_by_key(|(_, weight)| *weight)
        .map(|(key, _)| key as f32 / 10.0)
        .unwrap_or(0.0)
}

/// Integer key for a font size at 0.1 precision.
pub(crate) fn size_key(size: f32) -> i32 {
    (size * 10.0).round() as i32
}

fn join_items(items: &[TextItem], word_gap_factor: f32) -> String {
    let mut result = String::new();

    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            let prev = &items[i - 1];
            let gap = item.x - prev.right();

            let prev_ends_with_space = prev.text.ends_with(char::is_whitespace);
            let curr_starts_with_space = item.text.starts_with(char::is_whitespace);

            let spaceless_boundary = matches!(
                (prev.text.chars().last(), item.text.chars().next()),
                (Some(a), Some(b)) if is_spaceless_script_char(a) && is_spaceless_script_char(b)
            );

            if gap > item.font_size * word_gap_factor
                && !prev_ends_with_space
                && !curr_starts_with_space
                && !spaceless_boundary
            {
                result.push(' ');
            }
        }
        result.push_str(&item.text);
    }

    result
}

/// Check if a character belongs to a script written without word spaces.
///
/// Chinese and Japanese don't separate words with spaces, but Korean does,
/// so Hangul is not included.
pub(crate) fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and Extension A
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    // Extensions B-F
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana and Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}
