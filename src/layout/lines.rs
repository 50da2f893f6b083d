//! Line assembly: grouping the items of one page into visual rows.

use crate::model::{Line, TextItem};

use super::LayoutConfig;

/// Group the items of one page into lines, ordered top to bottom.
///
/// Items are ordered by descending y, with items whose y lies within
/// `row_tolerance` of a row's first item ordered left to right. Walking that
/// order, an item joins the current line while its y stays within
/// `line_join_factor` of its own font size from the line's anchor y.
pub fn group_into_lines(items: Vec<TextItem>, config: &LayoutConfig) -> Vec<Line> {
    if items.is_empty() {
        return vec![];
    }

    let sorted = reading_order(items, config.row_tolerance);

    let mut lines: Vec<Line> = Vec::new();
    let mut current: Vec<TextItem> = Vec::new();
    let mut anchor_y = sorted[0].y;

    for item in sorted {
        if current.is_empty() {
            anchor_y = item.y;
        } else if (item.y - anchor_y).abs() >= item.font_size * config.line_join_factor {
            lines.push(Line::from_items(
                std::mem::take(&mut current),
                anchor_y,
                config.word_gap_factor,
            ));
            anchor_y = item.y;
        }
        current.push(item);
    }

    if !current.is_empty() {
        lines.push(Line::from_items(current, anchor_y, config.word_gap_factor));
    }

    log::trace!("grouped into {} lines", lines.len());
    lines
}

/// Sort items top to bottom, then left to right within a row.
///
/// "Same row within a tolerance" is not transitive, so rather than using it
/// as a comparator the items are sorted by y alone and runs whose y stays
/// within `tolerance` of the run's first item are then sorted by x.
fn reading_order(mut items: Vec<TextItem>, tolerance: f32) -> Vec<TextItem> {
    items.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut start = 0;
    while start < items.len() {
        let row_y = items[start].y;
        let mut end = start + 1;
        while end < items.len() && (row_y - items[end].y).abs() <= tolerance {
            end += 1;
        }
        items[start..end].sort_by(|a, b| a.x.total_cmp(&b.x));
        start = end;
    }

    items
}
