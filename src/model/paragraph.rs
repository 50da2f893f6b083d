//! Paragraphs and the classified blocks produced from them.

use serde::Serialize;

use super::{Line, StructRole};

/// One or more lines merged as a single semantic block.
#[derive(Debug, Clone, Serialize)]
pub struct Paragraph {
    /// The lines, top to bottom. Never empty.
    pub lines: Vec<Line>,
    /// Structure role when the paragraph came from a tagged tree
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<StructRole>,
}

impl Paragraph {
    /// Start a paragraph with its first line.
    pub fn new(first: Line) -> Self {
        Self {
            lines: vec![first],
            role: None,
        }
    }

    /// Append a continuation line.
    pub fn push(&mut self, line: Line) {
        self.lines.push(line);
    }

    /// The first line.
    pub fn first_line(&self) -> &Line {
        // Constructed with one line and only ever grown.
        &self.lines[0]
    }

    /// The most recently added line.
    pub fn last_line(&self) -> &Line {
        &self.lines[self.lines.len() - 1]
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// True if every line is italic.
    pub fn is_italic(&self) -> bool {
        self.lines.iter().all(|l| l.is_italic)
    }
}

/// Inline emphasis applied to a body paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    /// Plain text
    None,
    /// Wrapped in `**`
    Bold,
    /// Wrapped in `*`
    Italic,
}

/// A classified unit of page content, ready for Markdown serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A heading (levels 1-3 on the heuristic path)
    Heading {
        /// Heading level
        level: u8,
        /// Cleaned heading text
        text: String,
    },
    /// A list item
    ListItem {
        /// True for numeric markers (`1.`, `2)`)
        ordered: bool,
        /// Item number for ordered items
        #[serde(skip_serializing_if = "Option::is_none")]
        number: Option<u32>,
        /// Content with the marker stripped
        text: String,
        /// Further lines of the same item
        #[serde(skip_serializing_if = "Vec::is_empty")]
        continuation: Vec<String>,
    },
    /// A body paragraph
    Paragraph {
        /// Cleaned paragraph text
        text: String,
        /// Inline emphasis
        emphasis: Emphasis,
    },
}

impl Block {
    /// Create a plain paragraph block.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph {
            text: text.into(),
            emphasis: Emphasis::None,
        }
    }

    /// Create a heading block.
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Block::Heading {
            level,
            text: text.into(),
        }
    }

    /// Check if this is a heading.
    pub fn is_heading(&self) -> bool {
        matches!(self, Block::Heading { .. })
    }

    /// Check if this is a list item.
    pub fn is_list_item(&self) -> bool {
        matches!(self, Block::ListItem { .. })
    }

    /// Get the heading level or None.
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            Block::Heading { level, .. } => Some(*level),
            _ => None,
        }
    }
}
