//! Rendering of tagged structure trees.
//!
//! Leaves of a structure tree carry no text themselves; each one consumes
//! the next string of the page's item stream. The stream is threaded through
//! the recursion as an [`ItemCursor`].

use crate::model::{is_spaceless_script_char, StructChild, StructNode, StructRole, TaggedPage};

use super::cleanup::{clean_text, collapse_blank_lines, CleanupOptions};
use super::markdown::BlockCounts;

/// Sequential reader over a page's item strings.
#[derive(Debug)]
pub struct ItemCursor<'a> {
    items: &'a [String],
    pos: usize,
}

impl<'a> ItemCursor<'a> {
    /// Create a cursor at the first item.
    pub fn new(items: &'a [String]) -> Self {
        Self { items, pos: 0 }
    }

    /// Number of items consumed so far.
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// Number of items not yet consumed.
    pub fn remaining(&self) -> usize {
        self.items.len() - self.pos
    }
}

impl<'a> Iterator for ItemCursor<'a> {
    type Item = &'a str;

    /// Consume the next item, or `None` once the stream is exhausted.
    fn next(&mut self) -> Option<&'a str> {
        let item = self.items.get(self.pos)?;
        self.pos += 1;
        Some(item.as_str())
    }
}

/// Rendered output of a subtree.
#[derive(Debug, Clone, PartialEq)]
enum Piece {
    /// Text that flows into the surrounding block
    Inline(String),
    /// A standalone block
    Block(String),
}

/// Renders tagged pages to Markdown.
#[derive(Debug, Default)]
pub struct TaggedRenderer {
    cleanup: CleanupOptions,
    counts: BlockCounts,
}

impl TaggedRenderer {
    /// Create a renderer with the given cleanup options.
    pub fn new(cleanup: CleanupOptions) -> Self {
        Self {
            cleanup,
            counts: BlockCounts::default(),
        }
    }

    /// Block counts accumulated over every rendered page.
    pub fn counts(&self) -> BlockCounts {
        self.counts
    }

    /// Render one tagged page.
    pub fn render_page(&mut self, page: &TaggedPage) -> String {
        let mut cursor = ItemCursor::new(&page.items);
        let output = match self.render_node(&page.root, &mut cursor) {
            Some(Piece::Inline(text)) => {
                self.counts.paragraphs += 1;
                text
            }
            Some(Piece::Block(text)) => text,
            None => String::new(),
        };
        if cursor.remaining() > 0 {
            log::debug!(
                "tagged page left {} of {} items unconsumed",
                cursor.remaining(),
                page.items.len()
            );
        }
        collapse_blank_lines(&output).trim().to_string()
    }

    /// Render a node, consuming one item per leaf in its subtree.
    ///
    /// Returns `None` when the subtree renders to nothing.
    fn render_node(&mut self, node: &StructNode, cursor: &mut ItemCursor<'_>) -> Option<Piece> {
        match &node.role {
            StructRole::Heading(level) => {
                let text = self.flat_text(node, cursor)?;
                self.counts.headings += 1;
                Some(Piece::Block(format!(
                    "{} {}",
                    "#".repeat((*level).clamp(1, 6) as usize),
                    text
                )))
            }
            StructRole::Paragraph => {
                let text = self.flat_text(node, cursor)?;
                self.counts.paragraphs += 1;
                Some(Piece::Block(text))
            }
            StructRole::List => {
                let items = self.render_children(node, cursor, "\n");
                items.map(Piece::Block)
            }
            StructRole::ListItem => self.render_list_item(node, cursor),
            StructRole::Table => {
                let text = self.flat_text(node, cursor)?;
                self.counts.paragraphs += 1;
                Some(Piece::Block(format!("```\n{}\n```", text)))
            }
            StructRole::Figure => {
                let text = self.flat_text(node, cursor)?;
                self.counts.paragraphs += 1;
                Some(Piece::Block(format!("*{}*", text)))
            }
            StructRole::BlockQuote => {
                let body = self.render_children(node, cursor, "\n\n")?;
                let quoted: Vec<String> = body
                    .lines()
                    .map(|line| {
                        if line.is_empty() {
                            ">".to_string()
                        } else {
                            format!("> {}", line)
                        }
                    })
                    .collect();
                Some(Piece::Block(quoted.join("\n")))
            }
            StructRole::Code => {
                let text = self.flat_text(node, cursor)?;
                let span = if text.contains('`') {
                    format!("`` {} ``", text)
                } else {
                    format!("`{}`", text)
                };
                Some(Piece::Inline(span))
            }
            StructRole::Link => self.flat_text(node, cursor).map(Piece::Inline),
            StructRole::Container | StructRole::Unknown(_) => self.pass_through(node, cursor),
        }
    }

    /// Render a list item as a single bullet.
    ///
    /// Nested list items (`LI` > `LBody`) merge into the outer bullet. Nested
    /// lists, tables, figures and quotes are indented beneath it.
    fn render_list_item(&mut self, node: &StructNode, cursor: &mut ItemCursor<'_>) -> Option<Piece> {
        let mut text = String::new();
        let mut nested: Vec<String> = Vec::new();
        self.collect_list_item(node, cursor, &mut text, &mut nested);

        let text = clean_text(&text, &self.cleanup);
        if text.is_empty() && nested.is_empty() {
            return None;
        }

        self.counts.list_items += 1;
        let mut output = format!("- {}", text).trim_end().to_string();
        for block in nested {
            for line in block.lines() {
                output.push('\n');
                if !line.is_empty() {
                    output.push_str("  ");
                    output.push_str(line);
                }
            }
        }
        Some(Piece::Block(output))
    }

    fn collect_list_item(
        &mut self,
        node: &StructNode,
        cursor: &mut ItemCursor<'_>,
        text: &mut String,
        nested: &mut Vec<String>,
    ) {
        for child in &node.children {
            match child {
                StructChild::Leaf => {
                    if let Some(item) = cursor.next() {
                        push_joined(text, item);
                    }
                }
                StructChild::Node(n) => match n.role {
                    StructRole::List => {
                        if let Some(rendered) = self.render_children(n, cursor, "\n") {
                            nested.push(rendered);
                        }
                    }
                    StructRole::Table | StructRole::Figure | StructRole::BlockQuote => {
                        if let Some(Piece::Block(rendered)) = self.render_node(n, cursor) {
                            nested.push(rendered);
                        }
                    }
                    StructRole::Code => self.push_code_span(n, cursor, text),
                    _ => self.collect_list_item(n, cursor, text, nested),
                },
            }
        }
    }

    /// Render children with no markup of their own.
    ///
    /// Inline-only content stays inline so it can flow into its parent.
    fn pass_through(&mut self, node: &StructNode, cursor: &mut ItemCursor<'_>) -> Option<Piece> {
        let pieces = self.child_pieces(node, cursor);
        if pieces.iter().all(|p| matches!(p, Piece::Inline(_))) {
            let mut text = String::new();
            for piece in &pieces {
                if let Piece::Inline(s) = piece {
                    push_joined(&mut text, s);
                }
            }
            let text = clean_text(&text, &self.cleanup);
            return (!text.is_empty()).then_some(Piece::Inline(text));
        }
        self.join_pieces(pieces, "\n\n").map(Piece::Block)
    }

    /// Render children and join them as blocks with `separator`.
    fn render_children(
        &mut self,
        node: &StructNode,
        cursor: &mut ItemCursor<'_>,
        separator: &str,
    ) -> Option<String> {
        let pieces = self.child_pieces(node, cursor);
        self.join_pieces(pieces, separator)
    }

    fn child_pieces(&mut self, node: &StructNode, cursor: &mut ItemCursor<'_>) -> Vec<Piece> {
        let mut pieces = Vec::new();
        for child in &node.children {
            match child {
                StructChild::Leaf => {
                    if let Some(item) = cursor.next() {
                        pieces.push(Piece::Inline(item.to_string()));
                    }
                }
                StructChild::Node(n) => {
                    if let Some(piece) = self.render_node(n, cursor) {
                        pieces.push(piece);
                    }
                }
            }
        }
        pieces
    }

    /// Join pieces: runs of inline text become one plain block.
    fn join_pieces(&mut self, pieces: Vec<Piece>, separator: &str) -> Option<String> {
        let mut blocks: Vec<String> = Vec::new();
        let mut run = String::new();

        for piece in pieces {
            match piece {
                Piece::Inline(text) => push_joined(&mut run, &text),
                Piece::Block(text) => {
                    self.flush_run(&mut run, &mut blocks);
                    if !text.trim().is_empty() {
                        blocks.push(text);
                    }
                }
            }
        }
        self.flush_run(&mut run, &mut blocks);

        let joined = blocks.join(separator);
        let joined = joined.trim();
        (!joined.is_empty()).then(|| joined.to_string())
    }

    fn flush_run(&mut self, run: &mut String, blocks: &mut Vec<String>) {
        let text = clean_text(run, &self.cleanup);
        run.clear();
        if !text.is_empty() {
            self.counts.paragraphs += 1;
            blocks.push(text);
        }
    }

    /// Text of every leaf in the subtree, in order.
    ///
    /// Code spans keep their backticks; any other nested role flows into the
    /// text without markup of its own.
    fn flat_text(&mut self, node: &StructNode, cursor: &mut ItemCursor<'_>) -> Option<String> {
        let mut text = String::new();
        self.collect_inline(node, cursor, &mut text);
        let text = clean_text(&text, &self.cleanup);
        (!text.is_empty()).then_some(text)
    }

    fn collect_inline(&mut self, node: &StructNode, cursor: &mut ItemCursor<'_>, text: &mut String) {
        for child in &node.children {
            match child {
                StructChild::Leaf => {
                    if let Some(item) = cursor.next() {
                        push_joined(text, item);
                    }
                }
                StructChild::Node(n) if n.role == StructRole::Code => {
                    self.push_code_span(n, cursor, text)
                }
                StructChild::Node(n) => self.collect_inline(n, cursor, text),
            }
        }
    }

    fn push_code_span(&mut self, node: &StructNode, cursor: &mut ItemCursor<'_>, text: &mut String) {
        if let Some(Piece::Inline(span)) = self.render_node(node, cursor) {
            push_joined(text, &span);
        }
    }
}

/// Render one tagged page with default cleanup.
pub fn render_tagged_page(page: &TaggedPage) -> String {
    TaggedRenderer::default().render_page(page)
}

/// Append `piece`, separating it from `text` with a space unless the
/// boundary already has whitespace or sits between spaceless-script characters.
fn push_joined(text: &mut String, piece: &str) {
    if piece.is_empty() {
        return;
    }
    let needs_space = match (text.chars().last(), piece.chars().next()) {
        (Some(a), Some(b)) => {
            !a.is_whitespace()
                && !b.is_whitespace()
                && !(is_spaceless_script_char(a) && is_spaceless_script_char(b))
        }
        _ => false,
    };
    if needs_space {
        text.push(' ');
    }
    text.push_str(piece);
}
