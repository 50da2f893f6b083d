//! lopdf-backed document source.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Document as LopdfDocument, ObjectId};

use crate::detect::{detect_header_from_bytes, PdfHeader};
use crate::error::{Error, Result};
use crate::model::{is_spaceless_script_char, RawFragment, TaggedPage};

use super::backend::DocumentSource;
use super::content::{interpret_page, ShownText};
use super::structure::StructTree;

/// A PDF document loaded with lopdf.
///
/// The structure tree is read once at load time. A malformed tree does not
/// fail the load; it is reported per page by
/// [`structure_tree`](DocumentSource::structure_tree) so that conversion can
/// fall back to layout analysis.
pub struct PdfSource {
    doc: LopdfDocument,
    header: PdfHeader,
    pages: BTreeMap<u32, ObjectId>,
    structure: std::result::Result<Option<StructTree>, String>,
}

impl PdfSource {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Load a PDF from memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let header = detect_header_from_bytes(data)?;
        let doc = LopdfDocument::load_mem(data)?;

        let pages = doc.get_pages();
        let structure = StructTree::read(&doc).map_err(|e| {
            log::warn!("Ignoring unreadable structure tree: {}", e);
            e.to_string()
        });

        log::debug!(
            "Loaded {} ({} pages, tagged: {})",
            header,
            pages.len(),
            matches!(structure, Ok(Some(_)))
        );

        Ok(Self {
            doc,
            header,
            pages,
            structure,
        })
    }

    /// PDF version from the file header.
    pub fn version(&self) -> &str {
        &self.header.version
    }

    /// Parsed file header.
    pub fn header(&self) -> &PdfHeader {
        &self.header
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.pages
            .get(&page)
            .copied()
            .ok_or(Error::PageOutOfRange(page, self.page_count()))
    }

    fn shown_text(&self, page: u32) -> Result<Vec<ShownText>> {
        let page_id = self.page_id(page)?;
        interpret_page(&self.doc, page_id).map_err(|e| Error::TextExtract {
            page,
            reason: e.to_string(),
        })
    }
}

impl DocumentSource for PdfSource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_fragments(&self, page: u32) -> Result<Vec<RawFragment>> {
        Ok(self
            .shown_text(page)?
            .into_iter()
            .map(|shown| shown.fragment)
            .collect())
    }

    fn structure_tree(&self, page: u32) -> Result<Option<TaggedPage>> {
        let tree = match &self.structure {
            Ok(Some(tree)) => tree,
            Ok(None) => return Ok(None),
            Err(message) => return Err(Error::Structure(message.clone())),
        };

        let page_id = self.page_id(page)?;
        let shown = self.shown_text(page)?;
        let texts = marked_texts(&shown);
        let (root, items) = tree.page_tree(page_id, &texts);

        if items.is_empty() && shown.iter().any(|s| !s.fragment.text.trim().is_empty()) {
            log::debug!("Page {} has text but no structure leaves", page);
            return Ok(None);
        }

        Ok(Some(TaggedPage::new(root, items)))
    }

    fn is_tagged(&self) -> bool {
        matches!(self.structure, Ok(Some(_)))
    }
}

/// Text drawn under each marked-content id, in content order.
fn marked_texts(shown: &[ShownText]) -> BTreeMap<i64, String> {
    let mut texts: BTreeMap<i64, String> = BTreeMap::new();
    let mut last: BTreeMap<i64, &RawFragment> = BTreeMap::new();

    for item in shown {
        let Some(mcid) = item.mcid else { continue };
        let text = texts.entry(mcid).or_default();
        if let Some(prev) = last.get(&mcid) {
            if needs_space(prev, &item.fragment, text) {
                text.push(' ');
            }
        }
        text.push_str(&item.fragment.text);
        last.insert(mcid, &item.fragment);
    }

    texts
}

/// Whether a space separates two fragments drawn under the same id.
fn needs_space(prev: &RawFragment, next: &RawFragment, so_far: &str) -> bool {
    let (Some(before), Some(after)) = (so_far.chars().last(), next.text.chars().next()) else {
        return false;
    };
    if before.is_whitespace() || after.is_whitespace() {
        return false;
    }
    if is_spaceless_script_char(before) && is_spaceless_script_char(after) {
        return false;
    }

    let size = prev.transform[3].abs().max(1.0);
    let prev_end = prev.transform[4] + prev.width;
    let gap = next.transform[4] - prev_end;
    let rise = (next.transform[5] - prev.transform[5]).abs();

    gap > size * 0.2 || rise > size * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shown(text: &str, x: f32, y: f32, width: f32, mcid: Option<i64>) -> ShownText {
        ShownText {
            fragment: RawFragment::new(text, 10.0, x, y).with_width(width),
            mcid,
        }
    }

    #[test]
    fn test_marked_texts_joins_by_position() {
        let items = vec![
            shown("Hel", 0.0, 100.0, 15.0, Some(0)),
            shown("lo", 15.0, 100.0, 10.0, Some(0)),
            shown("world", 40.0, 100.0, 25.0, Some(0)),
            shown("stray", 0.0, 80.0, 25.0, None),
            shown("Next", 0.0, 80.0, 20.0, Some(1)),
        ];
        let texts = marked_texts(&items);
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[&0], "Hello world");
        assert_eq!(texts[&1], "Next");
    }

    #[test]
    fn test_marked_texts_new_line_gets_space() {
        let items = vec![
            shown("first", 0.0, 100.0, 25.0, Some(3)),
            shown("second", 0.0, 88.0, 30.0, Some(3)),
        ];
        assert_eq!(marked_texts(&items)[&3], "first second");
    }

    #[test]
    fn test_marked_texts_cjk_no_space() {
        let items = vec![
            shown("日本", 0.0, 100.0, 20.0, Some(0)),
            shown("語", 0.0, 88.0, 10.0, Some(0)),
        ];
        assert_eq!(marked_texts(&items)[&0], "日本語");
    }

    #[test]
    fn test_from_bytes_rejects_non_pdf() {
        assert!(matches!(
            PdfSource::from_bytes(b"not a pdf"),
            Err(Error::UnknownFormat)
        ));
    }
}
