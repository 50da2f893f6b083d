//! Fragment normalization.

use crate::model::{RawFragment, TextItem};

/// Normalize a raw fragment into a text item.
///
/// Returns `None` for whitespace-only fragments. The font size is the
/// length of the transform's first column, rounded to 0.1 so that sizes
/// compare stably despite renderer noise. A degenerate transform gives size 0.
pub fn normalize_fragment(fragment: &RawFragment) -> Option<TextItem> {
    if fragment.text.trim().is_empty() {
        return None;
    }

    let [a, b, _, _, e, f] = fragment.transform;
    let font_size = round_tenth((a * a + b * b).sqrt());

    let mut item = TextItem::new(fragment.text.clone(), font_size, fragment.font_name.clone(), e, f)
        .with_width(fragment.width.max(0.0));
    if fragment.height > 0.0 {
        item.height = fragment.height;
    }
    Some(item)
}

/// Normalize every fragment of a page, dropping the whitespace-only ones.
pub fn normalize_page(fragments: &[RawFragment]) -> Vec<TextItem> {
    fragments.iter().filter_map(normalize_fragment).collect()
}

fn round_tenth(value: f32) -> f32 {
    if value.is_finite() {
        (value * 10.0).round() / 10.0
    } else {
        0.0
    }
}
