//! Paragraph segmentation.

use crate::model::{Line, Paragraph};

use super::classify::is_list_line;
use super::{FontStatistics, LayoutConfig};

/// Merge consecutive lines of one page into paragraphs.
///
/// Single forward pass: each line either continues the open paragraph or
/// starts a new one. Boundaries are never revisited.
pub fn segment_paragraphs(
    lines: Vec<Line>,
    stats: &FontStatistics,
    config: &LayoutConfig,
) -> Vec<Paragraph> {
    let mut paragraphs: Vec<Paragraph> = Vec::new();
    let mut current: Option<Paragraph> = None;

    for line in lines {
        if line.is_blank() {
            continue;
        }

        current = match current.take() {
            None => Some(Paragraph::new(line)),
            Some(mut para) => {
                if starts_new_paragraph(para.last_line(), &line, stats, config) {
                    paragraphs.push(para);
                    Some(Paragraph::new(line))
                } else {
                    para.push(line);
                    Some(para)
                }
            }
        };
    }

    if let Some(para) = current {
        paragraphs.push(para);
    }

    paragraphs
}

/// Decide whether `line` starts a new paragraph after `prev`.
pub fn starts_new_paragraph(
    prev: &Line,
    line: &Line,
    stats: &FontStatistics,
    config: &LayoutConfig,
) -> bool {
    if (line.font_size - prev.font_size).abs() > config.font_change_tolerance {
        return true;
    }

    let gap = (prev.y - line.y).abs();
    if gap > config.paragraph_gap_factor * prev.font_size.max(line.font_size) {
        return true;
    }

    // A new marker always opens a new item; with `split_list_items` off an
    // item may absorb the lines that follow it.
    if is_list_line(&line.text) || (config.split_list_items && is_list_line(&prev.text)) {
        return true;
    }

    stats.is_heading_size(line.font_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextItem;

    fn line(text: &str, size: f32, y: f32) -> Line {
        Line::from_items(vec![TextItem::new(text, size, "Times", 72.0, y)], y, 0.2)
    }

    fn stats() -> FontStatistics {
        FontStatistics {
            body_size: 12.0,
            heading_sizes: vec![24.0],
            heading_ratio: 1.15,
        }
    }

    fn texts(paras: &[Paragraph]) -> Vec<Vec<&str>> {
        paras
            .iter()
            .map(|p| p.lines.iter().map(|l| l.text.as_str()).collect())
            .collect()
    }

    #[test]
    fn test_wrapped_lines_merge() {
        let lines = vec![
            line("The quick brown fox", 12.0, 700.0),
            line("jumps over the lazy", 12.0, 686.0),
            line("dog.", 12.0, 672.0),
        ];
        let paras = segment_paragraphs(lines, &stats(), &LayoutConfig::default());
        assert_eq!(paras.len(), 1);
        assert_eq!(paras[0].line_count(), 3);
    }

    #[test]
    fn test_large_gap_breaks() {
        // 1.8 * 12 = 21.6
        let lines = vec![
            line("First paragraph.", 12.0, 700.0),
            line("Second paragraph.", 12.0, 670.0),
        ];
        let paras = segment_paragraphs(lines, &stats(), &LayoutConfig::default());
        assert_eq!(paras.len(), 2);
    }

    #[test]
    fn test_font_change_breaks() {
        let lines = vec![
            line("Normal text", 12.0, 700.0),
            line("Footnote text", 9.0, 690.0),
        ];
        let paras = segment_paragraphs(lines, &stats(), &LayoutConfig::default());
        assert_eq!(paras.len(), 2);

        // 0.5 exactly is not a change
        let lines = vec![line("a", 12.0, 700.0), line("b", 12.5, 688.0)];
        let paras = segment_paragraphs(lines, &stats(), &LayoutConfig::default());
        assert_eq!(paras.len(), 1);
    }

    #[test]
    fn test_list_items_isolated() {
        let lines = vec![
            line("Intro text", 12.0, 700.0),
            line("1. First item", 12.0, 686.0),
            line("2. Second item", 12.0, 672.0),
            line("Trailing text", 12.0, 658.0),
        ];
        let paras = segment_paragraphs(lines, &stats(), &LayoutConfig::default());
        assert_eq!(
            texts(&paras),
            vec![
                vec!["Intro text"],
                vec!["1. First item"],
                vec!["2. Second item"],
                vec!["Trailing text"],
            ]
        );
    }

    #[test]
    fn test_list_continuation_when_not_splitting() {
        let config = LayoutConfig::default().with_split_list_items(false);
        let lines = vec![
            line("- First item that", 12.0, 700.0),
            line("wraps onto a second line", 12.0, 686.0),
            line("- Second item", 12.0, 672.0),
        ];
        let paras = segment_paragraphs(lines, &stats(), &config);
        assert_eq!(
            texts(&paras),
            vec![
                vec!["- First item that", "wraps onto a second line"],
                vec!["- Second item"],
            ]
        );
    }

    #[test]
    fn test_heading_sized_line_starts_paragraph() {
        // Same size as the previous line, but heading-sized
        let lines = vec![
            line("Big Title", 24.0, 700.0),
            line("Subtitle in same size", 24.0, 676.0),
        ];
        let paras = segment_paragraphs(lines, &stats(), &LayoutConfig::default());
        assert_eq!(paras.len(), 2);
    }

    #[test]
    fn test_single_line_page() {
        let paras = segment_paragraphs(
            vec![line("Only line", 12.0, 700.0)],
            &stats(),
            &LayoutConfig::default(),
        );
        assert_eq!(paras.len(), 1);
        assert_eq!(paras[0].line_count(), 1);
        assert!(segment_paragraphs(vec![], &stats(), &LayoutConfig::default()).is_empty());
    }
}
