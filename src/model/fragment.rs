//! Raw page fragments and normalized text items.

use serde::{Deserialize, Serialize};

/// One positioned text run as produced by a document source.
///
/// `transform` is the rendering matrix `[a, b, c, d, e, f]` that maps glyph
/// space to page space, so the font size is folded into its scale terms and
/// `(e, f)` is the baseline origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFragment {
    /// Decoded text content
    pub text: String,
    /// Rendering transform `[a, b, c, d, e, f]`
    pub transform: [f32; 6],
    /// Font name (e.g., "Helvetica-Bold"), may be empty
    pub font_name: String,
    /// Advance width in page units (0 when unknown)
    pub width: f32,
    /// Glyph height in page units (0 when unknown)
    pub height: f32,
}

impl RawFragment {
    /// Create a fragment with an upright transform of the given size.
    pub fn new(text: impl Into<String>, font_size: f32, x: f32, y: f32) -> Self {
        Self {
            text: text.into(),
            transform: [font_size, 0.0, 0.0, font_size, x, y],
            font_name: String::new(),
            width: 0.0,
            height: font_size,
        }
    }

    /// Set the font name.
    pub fn with_font(mut self, font_name: impl Into<String>) -> Self {
        self.font_name = font_name.into();
        self
    }

    /// Set the advance width.
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }
}

/// A normalized text item: the atomic unit of layout analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    /// Non-empty text content
    pub text: String,
    /// Font size in points, rounded to 0.1
    pub font_size: f32,
    /// Font name, may be empty
    pub font_name: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline, origin bottom-left)
    pub y: f32,
    /// Width of the text
    pub width: f32,
    /// Height of the text
    pub height: f32,
    /// Whether the font name marks a bold face
    pub is_bold: bool,
    /// Whether the font name marks an italic face
    pub is_italic: bool,
}

impl TextItem {
    /// Create a text item, deriving the style flags from the font name.
    pub fn new(
        text: impl Into<String>,
        font_size: f32,
        font_name: impl Into<String>,
        x: f32,
        y: f32,
    ) -> Self {
        let font_name = font_name.into();
        let lower = font_name.to_lowercase();
        Self {
            text: text.into(),
            font_size,
            is_bold: lower.contains("bold") || lower.contains("black"),
            is_italic: lower.contains("italic") || lower.contains("oblique"),
            font_name,
            x,
            y,
            width: 0.0,
            height: font_size,
        }
    }

    /// Set the width.
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    /// Right edge of the item.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Number of characters, used as the weight in size statistics.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_flags_from_font_name() {
        let item = TextItem::new("Test", 12.0, "Helvetica-Bold", 0.0, 0.0);
        assert!(item.is_bold);
        assert!(!item.is_italic);

        let item = TextItem::new("Test", 12.0, "Helvetica-Oblique", 0.0, 0.0);
        assert!(!item.is_bold);
        assert!(item.is_italic);

        let item = TextItem::new("Test", 12.0, "ABCDEF+Inter-BlackItalic", 0.0, 0.0);
        assert!(item.is_bold);
        assert!(item.is_italic);

        let item = TextItem::new("Test", 12.0, "", 0.0, 0.0);
        assert!(!item.is_bold && !item.is_italic);
    }

    #[test]
    fn test_right_edge() {
        let item = TextItem::new("Hello", 10.0, "Times", 50.0, 700.0).with_width(24.5);
        assert!((item.right() - 74.5).abs() < f32::EPSILON);
        assert_eq!(item.char_count(), 5);
    }
}
