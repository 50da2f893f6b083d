//! Conversion results and analysis reports.

use serde::Serialize;

use crate::layout::FontStatistics;
use crate::model::Block;
use crate::render::BlockCounts;

/// The path a conversion actually took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Rendered from the structure tree
    Tagged,
    /// Rendered from layout analysis
    Heuristic,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Tagged => write!(f, "tagged"),
            Method::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// Statistics collected during conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConvertStats {
    /// Pages converted
    pub pages: u32,
    /// Pages that produced output
    pub pages_with_text: u32,
    /// Headings rendered
    pub headings: usize,
    /// List items rendered
    pub list_items: usize,
    /// Body paragraphs rendered
    pub paragraphs: usize,
    /// Estimated body font size (layout analysis only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_size: Option<f32>,
    /// Heading font sizes, largest first (layout analysis only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub heading_sizes: Vec<f32>,
}

impl ConvertStats {
    pub(crate) fn with_counts(mut self, counts: BlockCounts) -> Self {
        self.headings = counts.headings;
        self.list_items = counts.list_items;
        self.paragraphs = counts.paragraphs;
        self
    }

    pub(crate) fn with_font_statistics(mut self, stats: &FontStatistics) -> Self {
        self.body_size = Some(stats.body_size);
        self.heading_sizes = stats.heading_sizes.clone();
        self
    }
}

/// Result of converting a document.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertResult {
    /// The Markdown text, empty when nothing was extractable
    pub markdown: String,
    /// Path used to produce it
    pub strategy: Method,
    /// Conversion statistics
    pub stats: ConvertStats,
}

impl ConvertResult {
    /// Whether no text was extracted.
    pub fn is_empty(&self) -> bool {
        self.markdown.is_empty()
    }
}

/// Layout analysis of one page.
#[derive(Debug, Clone, Serialize)]
pub struct PageAnalysis {
    /// 1-based page number
    pub page: u32,
    /// Number of lines found
    pub lines: usize,
    /// Classified blocks in reading order
    pub blocks: Vec<Block>,
}

/// Layout analysis of a document, without rendering.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// Whether the document declares a structure tree
    pub tagged: bool,
    /// Document-wide font statistics
    pub stats: FontStatistics,
    /// Per-page results
    pub pages: Vec<PageAnalysis>,
}

impl Analysis {
    /// Block counts over every page.
    pub fn counts(&self) -> BlockCounts {
        let mut counts = BlockCounts::default();
        for block in self.pages.iter().flat_map(|p| &p.blocks) {
            counts.add(block);
        }
        counts
    }
}
