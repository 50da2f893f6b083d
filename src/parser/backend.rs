//! Document source abstraction.
//!
//! Layout analysis only needs per-page text fragments and, when available, a
//! per-page structure tree. [`DocumentSource`] isolates the concrete PDF
//! library from that logic; [`MemoryDocument`] serves embedders and tests
//! that already hold extracted fragments.

use crate::error::{Error, Result};
use crate::model::{RawFragment, TaggedPage};

/// Per-page access to a document's text and structure.
///
/// Pages are numbered from 1.
pub trait DocumentSource {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Raw text fragments of a page, in content order.
    fn page_fragments(&self, page: u32) -> Result<Vec<RawFragment>>;

    /// Structure tree of a page with its item stream.
    ///
    /// `Ok(None)` means the page carries no usable tree; an error means the
    /// tree exists but could not be read.
    fn structure_tree(&self, page: u32) -> Result<Option<TaggedPage>>;

    /// Whether the document declares a structure tree at all.
    fn is_tagged(&self) -> bool {
        false
    }
}

impl<T: DocumentSource + ?Sized> DocumentSource for &T {
    fn page_count(&self) -> u32 {
        (**self).page_count()
    }

    fn page_fragments(&self, page: u32) -> Result<Vec<RawFragment>> {
        (**self).page_fragments(page)
    }

    fn structure_tree(&self, page: u32) -> Result<Option<TaggedPage>> {
        (**self).structure_tree(page)
    }

    fn is_tagged(&self) -> bool {
        (**self).is_tagged()
    }
}

/// One page of a [`MemoryDocument`].
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    /// Text fragments in content order
    pub fragments: Vec<RawFragment>,
    /// Structure tree, if the page is tagged
    pub tagged: Option<TaggedPage>,
    /// Simulated failure reading the structure tree
    pub structure_error: Option<String>,
    /// Simulated failure reading the fragments
    pub fragment_error: Option<String>,
}

impl MemoryPage {
    /// Create an untagged page.
    pub fn new(fragments: Vec<RawFragment>) -> Self {
        Self {
            fragments,
            ..Default::default()
        }
    }

    /// Create a page with no text.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attach a structure tree.
    pub fn with_structure(mut self, tagged: TaggedPage) -> Self {
        self.tagged = Some(tagged);
        self
    }

    /// Make structure tree retrieval fail.
    pub fn with_structure_error(mut self, message: impl Into<String>) -> Self {
        self.structure_error = Some(message.into());
        self
    }

    /// Make fragment retrieval fail.
    pub fn with_fragment_error(mut self, message: impl Into<String>) -> Self {
        self.fragment_error = Some(message.into());
        self
    }
}

/// An in-memory document made of pre-extracted pages.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    pages: Vec<MemoryPage>,
}

impl MemoryDocument {
    /// Create a document with no pages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from pages.
    pub fn from_pages(pages: Vec<MemoryPage>) -> Self {
        Self { pages }
    }

    /// Append a page.
    pub fn with_page(mut self, page: MemoryPage) -> Self {
        self.pages.push(page);
        self
    }

    /// Append a page.
    pub fn push_page(&mut self, page: MemoryPage) {
        self.pages.push(page);
    }

    fn page(&self, page: u32) -> Result<&MemoryPage> {
        let count = self.page_count();
        if page == 0 || page > count {
            return Err(Error::PageOutOfRange(page, count));
        }
        Ok(&self.pages[(page - 1) as usize])
    }
}

impl DocumentSource for MemoryDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_fragments(&self, page: u32) -> Result<Vec<RawFragment>> {
        let p = self.page(page)?;
        if let Some(reason) = &p.fragment_error {
            return Err(Error::TextExtract {
                page,
                reason: reason.clone(),
            });
        }
        Ok(p.fragments.clone())
    }

    fn structure_tree(&self, page: u32) -> Result<Option<TaggedPage>> {
        let p = self.page(page)?;
        if let Some(message) = &p.structure_error {
            return Err(Error::Structure(message.clone()));
        }
        Ok(p.tagged.clone())
    }

    fn is_tagged(&self) -> bool {
        self.pages.iter().any(|p| p.tagged.is_some())
    }
}

/// Simple text decoding fallback when no encoding is available.
pub(crate) fn decode_text_simple(bytes: &[u8]) -> String {
    // Try UTF-16BE first (BOM marker)
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Fallback: Latin-1
    bytes.iter().map(|&b| b as char).collect()
}
