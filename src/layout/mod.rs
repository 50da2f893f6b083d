//! Layout analysis for untagged pages.
//!
//! Pages flow through the stages in order: fragments are normalized into
//! text items, grouped into lines, merged into paragraphs and classified
//! into blocks. Font statistics are estimated once from the lines of every
//! page before any page is classified.

mod classify;
mod config;
mod lines;
mod normalize;
mod segment;
mod stats;

pub use classify::{classify_page, classify_paragraph, is_list_line, parse_list_marker, ListMarker};
pub use config::LayoutConfig;
pub use lines::group_into_lines;
pub use normalize::{normalize_fragment, normalize_page};
pub use segment::{segment_paragraphs, starts_new_paragraph};
pub use stats::FontStatistics;

use crate::model::{Block, Line, RawFragment};
use crate::render::cleanup::CleanupOptions;

/// Normalize the fragments of one page and group them into lines.
pub fn page_lines(fragments: &[RawFragment], config: &LayoutConfig) -> Vec<Line> {
    group_into_lines(normalize_page(fragments), config)
}

/// Segment and classify the lines of one page.
pub fn page_blocks(
    lines: Vec<Line>,
    stats: &FontStatistics,
    config: &LayoutConfig,
    cleanup: &CleanupOptions,
) -> Vec<Block> {
    let paragraphs = segment_paragraphs(lines, stats, config);
    classify_page(&paragraphs, stats, config, cleanup)
}
