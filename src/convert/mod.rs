//! Document conversion: strategy selection between the structure tree and
//! layout analysis.
//!
//! A document is rendered from its structure tree only when every selected
//! page yields one. Any page without a tree, or with a tree that fails to
//! read, sends the whole document down the layout analysis path, so the two
//! are never mixed in one output.
//!
//! # Example
//!
//! ```
//! use pdfstruct::convert::{convert_source, ConvertOptions, Method};
//! use pdfstruct::model::RawFragment;
//! use pdfstruct::parser::{MemoryDocument, MemoryPage};
//!
//! let doc = MemoryDocument::new().with_page(MemoryPage::new(vec![
//!     RawFragment::new("Report", 24.0, 72.0, 720.0),
//!     RawFragment::new("Body text.", 12.0, 72.0, 690.0),
//! ]));
//!
//! let result = convert_source(&doc, &ConvertOptions::default()).unwrap();
//! assert_eq!(result.strategy, Method::Heuristic);
//! assert_eq!(result.markdown, "# Report\n\nBody text.");
//! ```

mod options;
mod result;

pub use options::{CancelToken, ConvertOptions, ErrorMode, PageSelection, Strategy};
pub use result::{Analysis, ConvertResult, ConvertStats, Method, PageAnalysis};

use crate::error::{Error, Result};
use crate::layout::{page_blocks, page_lines, FontStatistics};
use crate::model::{Line, TaggedPage};
use crate::parser::DocumentSource;
use crate::render::{join_pages, MarkdownRenderer, TaggedRenderer};

/// Convert a document to Markdown.
pub fn convert_source<S>(source: &S, options: &ConvertOptions) -> Result<ConvertResult>
where
    S: DocumentSource + ?Sized,
{
    convert_source_with_progress(source, options, |_, _| {})
}

/// Convert a document to Markdown, reporting progress.
///
/// `progress` receives `(done, total)` over the selected pages after each
/// page is collected.
pub fn convert_source_with_progress<S, F>(
    source: &S,
    options: &ConvertOptions,
    mut progress: F,
) -> Result<ConvertResult>
where
    S: DocumentSource + ?Sized,
    F: FnMut(u32, u32),
{
    options.layout.validate()?;
    let pages = selected_pages(source, options)?;
    if pages.is_empty() {
        return Ok(ConvertResult {
            markdown: String::new(),
            strategy: Method::Heuristic,
            stats: ConvertStats::default(),
        });
    }

    if options.strategy == Strategy::Auto {
        if let Some(result) = convert_tagged(source, &pages, options, &mut progress)? {
            return Ok(result);
        }
    }

    convert_heuristic(source, &pages, options, &mut progress)
}

/// Run layout analysis without rendering.
pub fn analyze_source<S>(source: &S, options: &ConvertOptions) -> Result<Analysis>
where
    S: DocumentSource + ?Sized,
{
    options.layout.validate()?;
    let pages = selected_pages(source, options)?;
    let collected = collect_lines(source, &pages, options, &mut |_, _| {})?;
    let stats = FontStatistics::estimate(collected.iter().flat_map(|(_, lines)| lines), &options.layout);

    let mut analyses = Vec::with_capacity(collected.len());
    for (page, lines) in collected {
        options.check_cancelled()?;
        let line_count = lines.len();
        let blocks = page_blocks(lines, &stats, &options.layout, &options.cleanup);
        analyses.push(PageAnalysis {
            page,
            lines: line_count,
            blocks,
        });
    }

    Ok(Analysis {
        tagged: source.is_tagged(),
        stats,
        pages: analyses,
    })
}

/// Pages to convert; empty only when the document has no pages.
fn selected_pages<S>(source: &S, options: &ConvertOptions) -> Result<Vec<u32>>
where
    S: DocumentSource + ?Sized,
{
    let total = source.page_count();
    if total == 0 {
        log::debug!("Document has no pages");
        return Ok(Vec::new());
    }
    let pages = options.pages.select(total);
    if pages.is_empty() {
        return Err(Error::InvalidPageRange(format!(
            "no selected page exists (document has {} pages)",
            total
        )));
    }
    Ok(pages)
}

/// Render from the structure tree, or `None` to fall back.
fn convert_tagged<S, F>(
    source: &S,
    pages: &[u32],
    options: &ConvertOptions,
    progress: &mut F,
) -> Result<Option<ConvertResult>>
where
    S: DocumentSource + ?Sized,
    F: FnMut(u32, u32),
{
    let total = pages.len() as u32;
    let mut trees: Vec<TaggedPage> = Vec::with_capacity(pages.len());

    for (done, &page) in pages.iter().enumerate() {
        options.check_cancelled()?;
        match source.structure_tree(page) {
            Ok(Some(tree)) => trees.push(tree),
            Ok(None) => {
                log::debug!("Page {} has no structure tree, using layout analysis", page);
                return Ok(None);
            }
            Err(e) => {
                log::debug!("Structure tree of page {} failed ({}), using layout analysis", page, e);
                return Ok(None);
            }
        }
        progress(done as u32 + 1, total);
    }

    let mut renderer = TaggedRenderer::new(options.cleanup.clone());
    let mut rendered = Vec::with_capacity(trees.len());
    for tree in &trees {
        options.check_cancelled()?;
        rendered.push(renderer.render_page(tree));
    }

    let pages_with_text = rendered.iter().filter(|p| !p.is_empty()).count() as u32;
    if pages_with_text == 0 {
        log::debug!("Structure tree produced no text, using layout analysis");
        return Ok(None);
    }

    Ok(Some(ConvertResult {
        markdown: join_pages(&rendered),
        strategy: Method::Tagged,
        stats: ConvertStats {
            pages: total,
            pages_with_text,
            ..Default::default()
        }
        .with_counts(renderer.counts()),
    }))
}

fn convert_heuristic<S, F>(
    source: &S,
    pages: &[u32],
    options: &ConvertOptions,
    progress: &mut F,
) -> Result<ConvertResult>
where
    S: DocumentSource + ?Sized,
    F: FnMut(u32, u32),
{
    let collected = collect_lines(source, pages, options, progress)?;
    let stats = FontStatistics::estimate(collected.iter().flat_map(|(_, lines)| lines), &options.layout);
    log::debug!(
        "Body size {:.1}, heading sizes {:?}",
        stats.body_size,
        stats.heading_sizes
    );

    let mut renderer = MarkdownRenderer::new();
    let mut rendered = Vec::with_capacity(collected.len());
    for (_, lines) in collected {
        options.check_cancelled()?;
        let blocks = page_blocks(lines, &stats, &options.layout, &options.cleanup);
        rendered.push(renderer.render_page(&blocks));
    }

    let pages_with_text = rendered.iter().filter(|p| !p.is_empty()).count() as u32;
    Ok(ConvertResult {
        markdown: join_pages(&rendered),
        strategy: Method::Heuristic,
        stats: ConvertStats {
            pages: pages.len() as u32,
            pages_with_text,
            ..Default::default()
        }
        .with_counts(renderer.counts())
        .with_font_statistics(&stats),
    })
}

/// Lines of every selected page, in page order.
fn collect_lines<S, F>(
    source: &S,
    pages: &[u32],
    options: &ConvertOptions,
    progress: &mut F,
) -> Result<Vec<(u32, Vec<Line>)>>
where
    S: DocumentSource + ?Sized,
    F: FnMut(u32, u32),
{
    let total = pages.len() as u32;
    let mut collected = Vec::with_capacity(pages.len());

    for (done, &page) in pages.iter().enumerate() {
        options.check_cancelled()?;
        let fragments = match source.page_fragments(page) {
            Ok(fragments) => fragments,
            Err(e) if options.error_mode == ErrorMode::Lenient => {
                log::warn!("Skipping page {}: {}", page, e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        collected.push((page, page_lines(&fragments, &options.layout)));
        progress(done as u32 + 1, total);
    }

    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RawFragment, StructNode};
    use crate::parser::{MemoryDocument, MemoryPage};

    fn body_page(text: &str) -> MemoryPage {
        MemoryPage::new(vec![RawFragment::new(text, 12.0, 72.0, 700.0)])
    }

    #[test]
    fn test_no_pages_gives_empty_markdown() {
        let doc = MemoryDocument::new();
        let result = convert_source(&doc, &ConvertOptions::default()).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.stats.pages, 0);
        assert_eq!(result.stats.pages_with_text, 0);

        // Any selection is fine when there is nothing to select from
        let options = ConvertOptions::new().with_pages(PageSelection::Range(4..=6));
        assert!(convert_source(&doc, &options).unwrap().is_empty());

        let analysis = analyze_source(&doc, &ConvertOptions::default()).unwrap();
        assert!(analysis.pages.is_empty());
    }

    #[test]
    fn test_empty_document_gives_empty_markdown() {
        let doc = MemoryDocument::new()
            .with_page(MemoryPage::empty())
            .with_page(MemoryPage::empty());
        let result = convert_source(&doc, &ConvertOptions::default()).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.stats.pages, 2);
        assert_eq!(result.stats.pages_with_text, 0);
    }

    #[test]
    fn test_tagged_requires_every_page() {
        let tree = TaggedPage::new(StructNode::tagged("P").with_leaf(), vec!["Tagged".into()]);
        let doc = MemoryDocument::new()
            .with_page(body_page("Untagged one").with_structure(tree))
            .with_page(body_page("Untagged two"));

        let result = convert_source(&doc, &ConvertOptions::default()).unwrap();
        assert_eq!(result.strategy, Method::Heuristic);
        assert_eq!(result.markdown, "Untagged one\n\n---\n\nUntagged two");

        // Restricting to the tagged page allows the tree
        let options = ConvertOptions::new().with_pages(PageSelection::Pages(vec![1]));
        let result = convert_source(&doc, &options).unwrap();
        assert_eq!(result.strategy, Method::Tagged);
        assert_eq!(result.markdown, "Tagged");
    }

    #[test]
    fn test_heuristic_strategy_ignores_tree() {
        let tree = TaggedPage::new(StructNode::tagged("P").with_leaf(), vec!["Tagged".into()]);
        let doc = MemoryDocument::new().with_page(body_page("Layout").with_structure(tree));
        let result = convert_source(&doc, &ConvertOptions::new().heuristic_only()).unwrap();
        assert_eq!(result.markdown, "Layout");
        assert_eq!(result.stats.body_size, Some(12.0));
    }

    #[test]
    fn test_progress_reports_each_page() {
        let doc = MemoryDocument::new()
            .with_page(body_page("a"))
            .with_page(body_page("b"))
            .with_page(body_page("c"));
        let mut seen = Vec::new();
        convert_source_with_progress(&doc, &ConvertOptions::default(), |done, total| {
            seen.push((done, total))
        })
        .unwrap();
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_selection_outside_document() {
        let doc = MemoryDocument::new().with_page(body_page("a"));
        let options = ConvertOptions::new().with_pages(PageSelection::Range(4..=6));
        assert!(matches!(
            convert_source(&doc, &options),
            Err(Error::InvalidPageRange(_))
        ));
    }

    #[test]
    fn test_analyze_source() {
        let doc = MemoryDocument::new().with_page(MemoryPage::new(vec![
            RawFragment::new("Title", 20.0, 72.0, 720.0),
            RawFragment::new("Body", 12.0, 72.0, 690.0),
        ]));
        let analysis = analyze_source(&doc, &ConvertOptions::default()).unwrap();
        assert!(!analysis.tagged);
        assert_eq!(analysis.stats.body_size, 12.0);
        assert_eq!(analysis.pages.len(), 1);
        assert_eq!(analysis.pages[0].lines, 2);
        assert_eq!(analysis.counts().headings, 1);
    }
}
