//! Tunable thresholds for the layout heuristics.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Numeric thresholds used by line assembly, segmentation and classification.
///
/// Every field has a default; JSON files only need to name the fields they
/// override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Items whose y differs by at most this many units share a sort row
    pub row_tolerance: f32,

    /// An item joins the current line if its y is within this fraction of its font size
    pub line_join_factor: f32,

    /// Horizontal gap, as a fraction of font size, read as a word space
    pub word_gap_factor: f32,

    /// Sizes above `body_size * heading_ratio` are heading sizes
    pub heading_ratio: f32,

    /// Font size change (absolute points) that breaks a paragraph
    pub font_change_tolerance: f32,

    /// Vertical gap, as a multiple of the larger font size, that breaks a paragraph
    pub paragraph_gap_factor: f32,

    /// Longest paragraph (in lines) still eligible to be a heading
    pub max_heading_lines: usize,

    /// Longest text (in characters) still eligible to be a heading
    pub max_heading_chars: usize,

    /// Body-sized bold lines shorter than this become H3
    pub bold_heading_max_chars: usize,

    /// Bold single lines shorter than this are wrapped in `**`
    pub bold_emphasis_max_chars: usize,

    /// Longest fully italic paragraph (in lines) wrapped in `*`
    pub italic_max_lines: usize,

    /// List-item lines always start and end their own paragraph
    pub split_list_items: bool,

    /// Body size assumed when a document has no sized text
    pub default_body_size: f32,
}

impl LayoutConfig {
    /// Create a configuration with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (possibly partial) configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a (possibly partial) configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Set the heading ratio.
    pub fn with_heading_ratio(mut self, ratio: f32) -> Self {
        self.heading_ratio = ratio;
        self
    }

    /// Set the paragraph gap factor.
    pub fn with_paragraph_gap(mut self, factor: f32) -> Self {
        self.paragraph_gap_factor = factor;
        self
    }

    /// Set the word gap factor.
    pub fn with_word_gap(mut self, factor: f32) -> Self {
        self.word_gap_factor = factor;
        self
    }

    /// Enable or disable splitting around list items.
    pub fn with_split_list_items(mut self, split: bool) -> Self {
        self.split_list_items = split;
        self
    }

    /// Check that the thresholds are usable.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("line_join_factor", self.line_join_factor),
            ("paragraph_gap_factor", self.paragraph_gap_factor),
            ("default_body_size", self.default_body_size),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::Config(format!("{} must be positive, got {}", name, value)));
            }
        }

        let non_negative = [
            ("row_tolerance", self.row_tolerance),
            ("word_gap_factor", self.word_gap_factor),
            ("font_change_tolerance", self.font_change_tolerance),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::Config(format!(
                    "{} must not be negative, got {}",
                    name, value
                )));
            }
        }

        if !(self.heading_ratio.is_finite() && self.heading_ratio >= 1.0) {
            return Err(Error::Config(format!(
                "heading_ratio must be at least 1.0, got {}",
                self.heading_ratio
            )));
        }

        Ok(())
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            row_tolerance: 3.0,
            line_join_factor: 0.5,
            word_gap_factor: 0.2,
            heading_ratio: 1.15,
            font_change_tolerance: 0.5,
            paragraph_gap_factor: 1.8,
            max_heading_lines: 2,
            max_heading_chars: 200,
            bold_heading_max_chars: 80,
            bold_emphasis_max_chars: 200,
            italic_max_lines: 2,
            split_list_items: true,
            default_body_size: 12.0,
        }
    }
}
