//! Markdown rendering of classified blocks.

use serde::Serialize;

use crate::model::{Block, Emphasis};

use super::cleanup::collapse_blank_lines;

/// Separator placed between non-empty pages.
pub const PAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Counts of rendered block kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BlockCounts {
    /// Headings rendered
    pub headings: usize,
    /// List items rendered
    pub list_items: usize,
    /// Body paragraphs rendered
    pub paragraphs: usize,
}

impl BlockCounts {
    /// Count one block.
    pub fn add(&mut self, block: &Block) {
        match block {
            Block::Heading { .. } => self.headings += 1,
            Block::ListItem { .. } => self.list_items += 1,
            Block::Paragraph { .. } => self.paragraphs += 1,
        }
    }

    /// Add another set of counts.
    pub fn merge(&mut self, other: BlockCounts) {
        self.headings += other.headings;
        self.list_items += other.list_items;
        self.paragraphs += other.paragraphs;
    }
}

/// Markdown renderer for heuristic pages.
#[derive(Debug, Default)]
pub struct MarkdownRenderer {
    counts: BlockCounts,
}

impl MarkdownRenderer {
    /// Create a new renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Block counts accumulated over every rendered page.
    pub fn counts(&self) -> BlockCounts {
        self.counts
    }

    /// Render the blocks of one page.
    pub fn render_page(&mut self, blocks: &[Block]) -> String {
        let mut output = String::new();
        let mut in_list = false;

        for block in blocks {
            self.counts.add(block);
            match block {
                Block::Heading { level, text } => {
                    ensure_blank_line(&mut output);
                    output.push_str(&"#".repeat(*level as usize));
                    output.push(' ');
                    output.push_str(text);
                    output.push_str("\n\n");
                    in_list = false;
                }
                Block::ListItem {
                    ordered,
                    number,
                    text,
                    continuation,
                } => {
                    if !in_list {
                        ensure_blank_line(&mut output);
                    }
                    let marker = if *ordered {
                        format!("{}.", number.unwrap_or(1))
                    } else {
                        "-".to_string()
                    };
                    output.push_str(&marker);
                    output.push(' ');
                    output.push_str(text);
                    output.push('\n');

                    let indent = " ".repeat(marker.chars().count() + 1);
                    for line in continuation {
                        output.push_str(&indent);
                        output.push_str(line);
                        output.push('\n');
                    }
                    in_list = true;
                }
                Block::Paragraph { text, emphasis } => {
                    ensure_blank_line(&mut output);
                    match emphasis {
                        Emphasis::None => output.push_str(text),
                        Emphasis::Bold => {
                            output.push_str("**");
                            output.push_str(text);
                            output.push_str("**");
                        }
                        Emphasis::Italic => {
                            output.push('*');
                            output.push_str(text);
                            output.push('*');
                        }
                    }
                    output.push('\n');
                    in_list = false;
                }
            }
        }

        collapse_blank_lines(&output).trim().to_string()
    }
}

/// Render the blocks of one page.
pub fn render_blocks(blocks: &[Block]) -> String {
    MarkdownRenderer::new().render_page(blocks)
}

/// Join rendered pages into one document.
///
/// Pages that rendered to nothing are skipped, so separators never double
/// up and never trail the final page.
pub fn join_pages<I>(pages: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut output = String::new();
    for page in pages {
        let page = page.as_ref().trim();
        if page.is_empty() {
            continue;
        }
        if !output.is_empty() {
            output.push_str(PAGE_SEPARATOR);
        }
        output.push_str(page);
    }
    collapse_blank_lines(&output).trim().to_string()
}

fn ensure_blank_line(output: &mut String) {
    if output.is_empty() {
        return;
    }
    while !output.ends_with("\n\n") {
        output.push('\n');
    }
}
