//! # pdfstruct
//!
//! Markdown structure inference for PDF text.
//!
//! Tagged documents are rendered from their structure tree. Everything else
//! goes through layout analysis: positioned text fragments are grouped into
//! lines and paragraphs, and font statistics gathered over the whole
//! document decide which paragraphs are headings, list items or emphasized
//! body text.
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> pdfstruct::Result<()> {
//!     let markdown = pdfstruct::convert_file("document.pdf")?;
//!     println!("{}", markdown);
//!     Ok(())
//! }
//! ```
//!
//! Text that was already extracted can be converted without a PDF through
//! [`parser::MemoryDocument`]:
//!
//! ```
//! use pdfstruct::model::RawFragment;
//! use pdfstruct::parser::{MemoryDocument, MemoryPage};
//! use pdfstruct::{convert_source, ConvertOptions};
//!
//! let doc = MemoryDocument::new().with_page(MemoryPage::new(vec![
//!     RawFragment::new("1. First item", 12.0, 72.0, 700.0),
//!     RawFragment::new("2. Second item", 12.0, 72.0, 686.0),
//! ]));
//! let result = convert_source(&doc, &ConvertOptions::default())?;
//! assert_eq!(result.markdown, "1. First item\n2. Second item");
//! # Ok::<(), pdfstruct::Error>(())
//! ```

pub mod convert;
pub mod detect;
pub mod error;
pub mod layout;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use convert::{
    analyze_source, convert_source, convert_source_with_progress, Analysis, CancelToken,
    ConvertOptions, ConvertResult, ConvertStats, ErrorMode, Method, PageSelection, Strategy,
};
pub use detect::{detect_header_from_bytes, detect_header_from_path, is_pdf_bytes, PdfHeader};
pub use error::{Error, Result};
pub use layout::{FontStatistics, LayoutConfig};
pub use model::{Block, RawFragment, StructNode, StructRole, TaggedPage};
pub use parser::{DocumentSource, MemoryDocument, MemoryPage, PdfSource};
pub use render::CleanupOptions;

use std::io::Read;
use std::path::Path;

/// Convert a PDF held in memory to Markdown.
///
/// Returns an empty string when the document has no extractable text.
///
/// # Example
///
/// ```no_run
/// let data = std::fs::read("document.pdf").unwrap();
/// let markdown = pdfstruct::convert_bytes(&data).unwrap();
/// ```
pub fn convert_bytes(data: &[u8]) -> Result<String> {
    Converter::new().convert_bytes(data).map(|r| r.markdown)
}

/// Convert a PDF file to Markdown.
///
/// # Example
///
/// ```no_run
/// let markdown = pdfstruct::convert_file("document.pdf").unwrap();
/// std::fs::write("output.md", markdown).unwrap();
/// ```
pub fn convert_file<P: AsRef<Path>>(path: P) -> Result<String> {
    Converter::new().convert_file(path).map(|r| r.markdown)
}

/// Convert a PDF read from a reader to Markdown.
pub fn convert_reader<R: Read>(mut reader: R) -> Result<String> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    convert_bytes(&data)
}

/// Builder for converting PDF documents.
///
/// # Example
///
/// ```no_run
/// use pdfstruct::{Converter, PageSelection};
///
/// let result = Converter::new()
///     .lenient()
///     .with_pages(PageSelection::parse("1-3")?)
///     .convert_file("document.pdf")?;
/// println!("{} ({})", result.markdown, result.strategy);
/// # Ok::<(), pdfstruct::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    /// Create a converter with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a converter from existing options.
    pub fn with_options(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// Treat unreadable pages as empty.
    pub fn lenient(mut self) -> Self {
        self.options = self.options.lenient();
        self
    }

    /// Skip the structure tree.
    pub fn heuristic_only(mut self) -> Self {
        self.options = self.options.heuristic_only();
        self
    }

    /// Set the layout configuration.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.options = self.options.with_layout(layout);
        self
    }

    /// Set the cleanup rules.
    pub fn with_cleanup(mut self, cleanup: CleanupOptions) -> Self {
        self.options = self.options.with_cleanup(cleanup);
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.options = self.options.with_pages(pages);
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.options = self.options.with_cancel_token(token);
        self
    }

    /// The options in effect.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert a PDF file.
    pub fn convert_file<P: AsRef<Path>>(&self, path: P) -> Result<ConvertResult> {
        let source = PdfSource::open(path)?;
        self.convert_source(&source)
    }

    /// Convert a PDF held in memory.
    pub fn convert_bytes(&self, data: &[u8]) -> Result<ConvertResult> {
        let source = PdfSource::from_bytes(data)?;
        self.convert_source(&source)
    }

    /// Convert any document source.
    pub fn convert_source<S: DocumentSource + ?Sized>(&self, source: &S) -> Result<ConvertResult> {
        convert::convert_source(source, &self.options)
    }

    /// Analyze the layout of any document source.
    pub fn analyze_source<S: DocumentSource + ?Sized>(&self, source: &S) -> Result<Analysis> {
        convert::analyze_source(source, &self.options)
    }
}
