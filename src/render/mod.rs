//! Markdown rendering for classified pages and tagged trees.

pub mod cleanup;
mod markdown;
mod tagged;

pub use cleanup::{clean_text, collapse_blank_lines, join_lines, CleanupOptions};
pub use markdown::{join_pages, render_blocks, BlockCounts, MarkdownRenderer, PAGE_SEPARATOR};
pub use tagged::{render_tagged_page, ItemCursor, TaggedRenderer};
