//! Integration tests for layout-analysis conversion.

use std::cell::Cell;

use pdfstruct::convert::{
    analyze_source, convert_source, convert_source_with_progress, CancelToken, ConvertOptions,
    ErrorMode, Method, PageSelection,
};
use pdfstruct::error::{Error, Result};
use pdfstruct::layout::LayoutConfig;
use pdfstruct::model::{RawFragment, StructNode, TaggedPage};
use pdfstruct::parser::{DocumentSource, MemoryDocument, MemoryPage};
use pdfstruct::render::CleanupOptions;

fn frag(text: &str, size: f32, y: f32) -> RawFragment {
    RawFragment::new(text, size, 72.0, y)
}

fn styled(text: &str, size: f32, y: f32, font: &str) -> RawFragment {
    RawFragment::new(text, size, 72.0, y).with_font(font)
}

fn single_page(fragments: Vec<RawFragment>) -> MemoryDocument {
    MemoryDocument::new().with_page(MemoryPage::new(fragments))
}

fn markdown(doc: &MemoryDocument) -> String {
    convert_source(doc, &ConvertOptions::default())
        .unwrap()
        .markdown
}

/// A document mixing every block kind over two pages.
fn report() -> MemoryDocument {
    MemoryDocument::new()
        .with_page(MemoryPage::new(vec![
            frag("Quarterly Report", 24.0, 750.0),
            frag("Sales rose in every region this quarter.", 12.0, 720.0),
            frag("Margins held steady despite costs.", 12.0, 706.0),
            frag("Regional Results", 18.0, 670.0),
            frag("• North grew fastest", 12.0, 640.0),
            frag("• South recovered", 12.0, 626.0),
            styled("Key Findings", 12.0, 590.0, "Helvetica-Bold"),
            frag("Demand remains strong across segments.", 12.0, 560.0),
        ]))
        .with_page(MemoryPage::new(vec![
            frag("Outlook", 16.0, 750.0),
            frag("1. Expand capacity", 12.0, 720.0),
            frag("2. Hire engineers", 12.0, 706.0),
            styled("Figures are preliminary.", 12.0, 670.0, "Times-Italic"),
        ]))
}

fn heading_levels(markdown: &str) -> Vec<(usize, String)> {
    markdown
        .lines()
        .filter(|l| l.starts_with('#'))
        .map(|l| {
            let level = l.chars().take_while(|c| *c == '#').count();
            (level, l[level..].trim().to_string())
        })
        .collect()
}

#[test]
fn test_title_scenario() {
    let doc = single_page(vec![
        frag("Annual Report", 24.0, 720.0),
        frag("Revenue grew in every region.", 12.0, 690.0),
        frag("Costs stayed flat.", 12.0, 676.0),
    ]);
    assert_eq!(
        markdown(&doc),
        "# Annual Report\n\nRevenue grew in every region. Costs stayed flat."
    );
}

#[test]
fn test_full_report() {
    let result = convert_source(&report(), &ConvertOptions::default()).unwrap();
    assert_eq!(result.strategy, Method::Heuristic);
    assert_eq!(
        result.markdown,
        "# Quarterly Report\n\n\
         Sales rose in every region this quarter. Margins held steady despite costs.\n\n\
         ## Regional Results\n\n\
         - North grew fastest\n\
         - South recovered\n\n\
         ### Key Findings\n\n\
         Demand remains strong across segments.\n\n\
         ---\n\n\
         ### Outlook\n\n\
         1. Expand capacity\n\
         2. Hire engineers\n\n\
         *Figures are preliminary.*"
    );

    let stats = result.stats;
    assert_eq!(stats.pages, 2);
    assert_eq!(stats.pages_with_text, 2);
    assert_eq!(stats.headings, 4);
    assert_eq!(stats.list_items, 4);
    assert_eq!(stats.paragraphs, 3);
    assert_eq!(stats.body_size, Some(12.0));
    assert_eq!(stats.heading_sizes, vec![24.0, 18.0, 16.0]);
}

#[test]
fn test_idempotent() {
    let doc = report();
    let first = markdown(&doc);
    let second = markdown(&doc);
    assert_eq!(first, second);
}

#[test]
fn test_heading_levels_monotonic() {
    let body = "Body text that outweighs every heading size.";
    let doc = single_page(vec![
        frag("Alpha", 24.0, 750.0),
        frag(body, 12.0, 720.0),
        frag("Beta", 18.0, 690.0),
        frag(body, 12.0, 660.0),
        frag("Gamma", 16.0, 630.0),
        frag(body, 12.0, 600.0),
        frag("Delta", 14.0, 570.0),
        frag(body, 12.0, 540.0),
    ]);

    let headings = heading_levels(&markdown(&doc));
    let sizes = [24.0_f32, 18.0, 16.0, 14.0];
    assert_eq!(headings.len(), 4);
    assert_eq!(
        headings.iter().map(|(l, _)| *l).collect::<Vec<_>>(),
        vec![1, 2, 3, 3]
    );
    for i in 0..sizes.len() {
        for j in 0..sizes.len() {
            if sizes[i] > sizes[j] {
                assert!(headings[i].0 <= headings[j].0);
            }
        }
    }
}

#[test]
fn test_no_information_loss() {
    let doc = report();
    let input: usize = (1..=doc.page_count())
        .flat_map(|p| doc.page_fragments(p).unwrap())
        .map(|f| f.text.chars().filter(|c| !c.is_whitespace()).count())
        .sum();

    let output = markdown(&doc)
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '#' | '*' | '-'))
        .count();
    assert!(output <= input, "{} > {}", output, input);
}

#[test]
fn test_no_triple_newlines() {
    let doc = MemoryDocument::new()
        .with_page(MemoryPage::new(vec![frag("Only page one.", 12.0, 700.0)]))
        .with_page(MemoryPage::empty())
        .with_page(MemoryPage::new(vec![
            frag("   ", 12.0, 700.0),
            frag("Big", 30.0, 650.0),
            frag("- item", 12.0, 600.0),
        ]));
    let output = markdown(&doc);
    assert!(!output.contains("\n\n\n"));
    assert!(!output.starts_with('\n') && !output.ends_with('\n'));
    // The empty page does not double the separator
    assert_eq!(output.matches("---").count(), 1);
}

#[test]
fn test_ordered_list_fidelity() {
    let doc = single_page(vec![
        frag("1. First item", 12.0, 700.0),
        frag("2. Second item", 12.0, 686.0),
    ]);
    assert_eq!(markdown(&doc), "1. First item\n2. Second item");
}

#[test]
fn test_list_after_paragraph_gets_blank_line() {
    let doc = single_page(vec![
        frag("Pick one of these:", 12.0, 700.0),
        frag("a) apples", 12.0, 686.0),
        frag("b) pears", 12.0, 672.0),
    ]);
    assert_eq!(markdown(&doc), "Pick one of these:\n\n- apples\n- pears");
}

#[test]
fn test_list_continuation_lines() {
    let doc = MemoryDocument::new().with_page(MemoryPage::new(vec![
        frag("• A long item that", 12.0, 700.0),
        frag("wraps onto a second line", 12.0, 686.0),
    ]));
    let options = ConvertOptions::new().with_layout(LayoutConfig::default().with_split_list_items(false));
    let result = convert_source(&doc, &options).unwrap();
    assert_eq!(result.markdown, "- A long item that\n  wraps onto a second line");
}

#[test]
fn test_bold_emphasis_with_punctuation() {
    let doc = single_page(vec![
        frag("Some ordinary introductory text here.", 12.0, 700.0),
        styled("Read this first.", 12.0, 660.0, "Arial-BoldMT"),
    ]);
    assert_eq!(
        markdown(&doc),
        "Some ordinary introductory text here.\n\n**Read this first.**"
    );
}

#[test]
fn test_zero_items() {
    let doc = MemoryDocument::new()
        .with_page(MemoryPage::empty())
        .with_page(MemoryPage::new(vec![frag("  ", 12.0, 700.0), frag("\t", 12.0, 680.0)]));
    let result = convert_source(&doc, &ConvertOptions::default()).unwrap();
    assert_eq!(result.markdown, "");
    assert_eq!(result.stats.pages_with_text, 0);
}

#[test]
fn test_structure_failure_on_first_page_falls_back() {
    let tagged = TaggedPage::new(
        StructNode::tagged("P").with_leaf(),
        vec!["Tagged text".into()],
    );
    let doc = MemoryDocument::new()
        .with_page(
            MemoryPage::new(vec![frag("First page body.", 12.0, 700.0)])
                .with_structure_error("cycle in structure tree"),
        )
        .with_page(MemoryPage::new(vec![frag("Second page body.", 12.0, 700.0)]).with_structure(tagged));

    let result = convert_source(&doc, &ConvertOptions::default()).unwrap();
    assert_eq!(result.strategy, Method::Heuristic);
    assert_eq!(
        result.markdown,
        "First page body.\n\n---\n\nSecond page body."
    );
}

#[test]
fn test_structure_failure_on_later_page_falls_back() {
    let tagged = TaggedPage::new(
        StructNode::tagged("H1").with_leaf(),
        vec!["Tree heading".into()],
    );
    let doc = MemoryDocument::new()
        .with_page(MemoryPage::new(vec![frag("Layout text one.", 12.0, 700.0)]).with_structure(tagged))
        .with_page(
            MemoryPage::new(vec![frag("Layout text two.", 12.0, 700.0)])
                .with_structure_error("unresolved reference"),
        );

    let result = convert_source(&doc, &ConvertOptions::default()).unwrap();
    assert_eq!(result.strategy, Method::Heuristic);
    assert_eq!(
        result.markdown,
        "Layout text one.\n\n---\n\nLayout text two."
    );
    assert!(!result.markdown.contains("Tree heading"));
    assert_eq!(result.stats.headings, 0);
}

#[test]
fn test_zero_pages() {
    let result = convert_source(&MemoryDocument::new(), &ConvertOptions::default()).unwrap();
    assert_eq!(result.markdown, "");
    assert_eq!(result.stats.pages, 0);
}

#[test]
fn test_strict_mode_propagates_page_failure() {
    let doc = MemoryDocument::new()
        .with_page(MemoryPage::new(vec![frag("Fine.", 12.0, 700.0)]))
        .with_page(MemoryPage::empty().with_fragment_error("bad operator"));

    let result = convert_source(&doc, &ConvertOptions::default());
    assert!(matches!(result, Err(Error::TextExtract { page: 2, .. })));
}

#[test]
fn test_lenient_mode_skips_page() {
    let doc = MemoryDocument::new()
        .with_page(MemoryPage::empty().with_fragment_error("bad operator"))
        .with_page(MemoryPage::new(vec![frag("Fine.", 12.0, 700.0)]));

    let options = ConvertOptions::new().with_error_mode(ErrorMode::Lenient);
    let result = convert_source(&doc, &options).unwrap();
    assert_eq!(result.markdown, "Fine.");
    assert_eq!(result.stats.pages, 2);
    assert_eq!(result.stats.pages_with_text, 1);
}

#[test]
fn test_cancelled_before_start() {
    let token = CancelToken::new();
    token.cancel();
    let options = ConvertOptions::new().with_cancel_token(token);
    assert!(matches!(
        convert_source(&report(), &options),
        Err(Error::Cancelled)
    ));
}

#[test]
fn test_cancelled_between_pages() {
    let token = CancelToken::new();
    let options = ConvertOptions::new().with_cancel_token(token.clone());
    let result = convert_source_with_progress(&report(), &options, |done, _| {
        if done == 1 {
            token.cancel();
        }
    });
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[test]
fn test_page_selection() {
    let options = ConvertOptions::new().with_pages(PageSelection::parse("2").unwrap());
    let result = convert_source(&report(), &options).unwrap();
    assert_eq!(result.stats.pages, 1);
    assert!(result.markdown.starts_with("# Outlook"));
    assert!(!result.markdown.contains("---"));
}

#[test]
fn test_statistics_span_all_pages() {
    // Page 2 alone would make 16pt the body size
    let doc = MemoryDocument::new()
        .with_page(MemoryPage::new(vec![frag(
            "A long page of ordinary body text that sets the body size.",
            12.0,
            700.0,
        )]))
        .with_page(MemoryPage::new(vec![frag("Short", 16.0, 700.0)]));
    assert_eq!(
        markdown(&doc),
        "A long page of ordinary body text that sets the body size.\n\n---\n\n# Short"
    );
}

#[test]
fn test_cleanup_rules() {
    let doc = single_page(vec![
        frag("The \u{FB01}nal  re\u{00AD}sult is read-", 12.0, 700.0),
        frag("able\u{FFFD} by all.", 12.0, 686.0),
    ]);
    assert_eq!(markdown(&doc), "The final result is read- able by all.");

    let options = ConvertOptions::new().with_cleanup(CleanupOptions::default().with_dehyphenate(true));
    let result = convert_source(&doc, &options).unwrap();
    assert_eq!(result.markdown, "The final result is readable by all.");
}

#[test]
fn test_layout_config_from_json() {
    let config = LayoutConfig::from_json_str(r#"{ "heading_ratio": 3.0 }"#).unwrap();
    let doc = single_page(vec![
        frag("Annual Report", 24.0, 720.0),
        frag("Revenue grew in every region.", 12.0, 690.0),
    ]);
    let result = convert_source(&doc, &ConvertOptions::new().with_layout(config)).unwrap();
    assert_eq!(result.markdown, "Annual Report\n\nRevenue grew in every region.");
}

#[test]
fn test_invalid_layout_config() {
    let options = ConvertOptions::new().with_layout(LayoutConfig::default().with_heading_ratio(0.0));
    assert!(matches!(
        convert_source(&report(), &options),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_analyze_matches_conversion() {
    let doc = report();
    let analysis = analyze_source(&doc, &ConvertOptions::default()).unwrap();
    let result = convert_source(&doc, &ConvertOptions::default()).unwrap();

    let counts = analysis.counts();
    assert_eq!(counts.headings, result.stats.headings);
    assert_eq!(counts.list_items, result.stats.list_items);
    assert_eq!(analysis.stats.heading_sizes, result.stats.heading_sizes);

    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["pages"][0]["blocks"][0]["type"], "heading");
    assert_eq!(json["pages"][0]["blocks"][0]["level"], 1);
}

/// Source that counts structure lookups.
struct CountingSource {
    inner: MemoryDocument,
    structure_calls: Cell<u32>,
}

impl DocumentSource for CountingSource {
    fn page_count(&self) -> u32 {
        self.inner.page_count()
    }

    fn page_fragments(&self, page: u32) -> Result<Vec<RawFragment>> {
        self.inner.page_fragments(page)
    }

    fn structure_tree(&self, page: u32) -> Result<Option<TaggedPage>> {
        self.structure_calls.set(self.structure_calls.get() + 1);
        self.inner.structure_tree(page)
    }
}

#[test]
fn test_heuristic_strategy_skips_structure() {
    let source = CountingSource {
        inner: report(),
        structure_calls: Cell::new(0),
    };

    convert_source(&source, &ConvertOptions::new().heuristic_only()).unwrap();
    assert_eq!(source.structure_calls.get(), 0);

    // Auto stops at the first page without a tree
    convert_source(&source, &ConvertOptions::default()).unwrap();
    assert_eq!(source.structure_calls.get(), 1);
}
