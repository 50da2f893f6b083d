//! Conversion options.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::layout::LayoutConfig;
use crate::render::CleanupOptions;

/// Which conversion path to attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Use the structure tree when every selected page has one,
    /// layout analysis otherwise
    #[default]
    Auto,
    /// Always use layout analysis
    Heuristic,
}

/// How page-level extraction failures are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on the first page that cannot be read
    #[default]
    Strict,
    /// Log a warning and treat the page as empty
    Lenient,
}

/// Shared flag for aborting a conversion between pages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Page selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Specific pages (1-indexed, ascending)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number is selected.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Selected pages of a document with `total` pages, in increasing order.
    pub fn select(&self, total: u32) -> Vec<u32> {
        (1..=total).filter(|p| self.includes(*p)).collect()
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        if !s.contains(',') {
            if let Some((start, end)) = s.split_once('-') {
                let (start, end) = parse_range(s, start, end)?;
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let (start, end) = parse_range(part, start, end)?;
                pages.extend(start..=end);
            } else {
                pages.push(parse_page(part)?);
            }
        }

        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}

fn parse_page(s: &str) -> Result<u32> {
    match s.trim().parse::<u32>() {
        Ok(0) => Err(Error::InvalidPageRange("pages are numbered from 1".to_string())),
        Ok(page) => Ok(page),
        Err(_) => Err(Error::InvalidPageRange(format!("invalid page number '{}'", s.trim()))),
    }
}

fn parse_range(part: &str, start: &str, end: &str) -> Result<(u32, u32)> {
    let start = parse_page(start)?;
    let end = parse_page(end)?;
    if start > end {
        return Err(Error::InvalidPageRange(format!("'{}' is descending", part)));
    }
    Ok((start, end))
}

/// Options for converting a document.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Layout analysis thresholds
    pub layout: LayoutConfig,
    /// Text cleanup rules
    pub cleanup: CleanupOptions,
    /// Conversion path
    pub strategy: Strategy,
    /// Pages to convert
    pub pages: PageSelection,
    /// Handling of unreadable pages
    pub error_mode: ErrorMode,
    /// Cancellation flag checked between pages
    pub cancel: Option<CancelToken>,
}

impl ConvertOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the layout configuration.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Set the cleanup rules.
    pub fn with_cleanup(mut self, cleanup: CleanupOptions) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Set the conversion strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Skip the structure tree and always analyze layout.
    pub fn heuristic_only(mut self) -> Self {
        self.strategy = Strategy::Heuristic;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Treat unreadable pages as empty.
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub(crate) fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let token = CancelToken::new();
        let options = ConvertOptions::new()
            .heuristic_only()
            .lenient()
            .with_pages(PageSelection::Range(2..=3))
            .with_cancel_token(token.clone());

        assert_eq!(options.strategy, Strategy::Heuristic);
        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert!(options.check_cancelled().is_ok());
        token.cancel();
        assert!(matches!(options.check_cancelled(), Err(Error::Cancelled)));
    }

    #[test]
    fn test_defaults() {
        let options = ConvertOptions::default();
        assert_eq!(options.strategy, Strategy::Auto);
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert_eq!(options.pages, PageSelection::All);
        assert!(options.cancel.is_none());
    }

    #[test]
    fn test_page_selection_includes() {
        let range = PageSelection::Range(5..=10);
        assert!(!range.includes(4));
        assert!(range.includes(5));
        assert!(range.includes(10));
        assert!(!range.includes(11));

        let pages = PageSelection::Pages(vec![1, 3]);
        assert!(pages.includes(3));
        assert!(!pages.includes(2));
    }

    #[test]
    fn test_page_selection_parse() {
        assert_eq!(PageSelection::parse("all").unwrap(), PageSelection::All);
        assert_eq!(PageSelection::parse("").unwrap(), PageSelection::All);
        assert_eq!(PageSelection::parse("2-4").unwrap(), PageSelection::Range(2..=4));
        assert_eq!(
            PageSelection::parse("7, 1,3-5,3").unwrap(),
            PageSelection::Pages(vec![1, 3, 4, 5, 7])
        );
    }

    #[test]
    fn test_page_selection_parse_errors() {
        for bad in ["0", "abc", "5-2", "1,x", "1-"] {
            assert!(
                matches!(PageSelection::parse(bad), Err(Error::InvalidPageRange(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_page_selection_select() {
        assert_eq!(PageSelection::All.select(3), vec![1, 2, 3]);
        assert_eq!(PageSelection::Range(2..=9).select(4), vec![2, 3, 4]);
        assert_eq!(PageSelection::Pages(vec![1, 8]).select(4), vec![1]);
    }
}
