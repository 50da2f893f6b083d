//! Document-wide font statistics.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{size_key, Line};

use super::LayoutConfig;

/// Body size and heading sizes of a document.
///
/// Computed once from every line of every page before any page is
/// classified, then only read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontStatistics {
    /// Body text font size (heaviest by character count)
    pub body_size: f32,
    /// Distinct sizes above `body_size * heading_ratio`, largest first
    pub heading_sizes: Vec<f32>,
    /// Ratio a size must exceed relative to the body size to count as a heading
    pub heading_ratio: f32,
}

impl FontStatistics {
    /// Estimate statistics from the lines of all pages.
    pub fn estimate<'a, I>(lines: I, config: &LayoutConfig) -> Self
    where
        I: IntoIterator<Item = &'a Line>,
    {
        let mut histogram = SizeHistogram::default();
        for line in lines {
            histogram.add(line.font_size, line.char_count());
        }
        histogram.analyze(config)
    }

    /// Statistics with a fixed body size and no heading sizes.
    pub fn with_body_size(body_size: f32, heading_ratio: f32) -> Self {
        Self {
            body_size,
            heading_sizes: Vec::new(),
            heading_ratio,
        }
    }

    /// Smallest size that is strictly heading-sized.
    pub fn heading_threshold(&self) -> f32 {
        self.body_size * self.heading_ratio
    }

    /// Check if a size exceeds the heading threshold.
    pub fn is_heading_size(&self, font_size: f32) -> bool {
        font_size > self.heading_threshold()
    }

    /// Rank of a size among the heading sizes (0 = largest).
    ///
    /// Counts the heading sizes strictly larger than `font_size`, which is the
    /// index for sizes in the list and stays monotonic for sizes between
    /// entries.
    pub fn heading_rank(&self, font_size: f32) -> usize {
        let key = size_key(font_size);
        self.heading_sizes
            .iter()
            .filter(|s| size_key(**s) > key)
            .count()
    }

    /// Heading level for a size: rank 0 is H1, rank 1 is H2, anything else H3.
    pub fn heading_level(&self, font_size: f32) -> u8 {
        match self.heading_rank(font_size) {
            0 => 1,
            1 => 2,
            _ => 3,
        }
    }
}

/// Character-weighted frequency table of font sizes at 0.1 precision.
#[derive(Debug, Default)]
struct SizeHistogram {
    weights: BTreeMap<i32, usize>,
}

impl SizeHistogram {
    fn add(&mut self, size: f32, chars: usize) {
        let key = size_key(size);
        if key <= 0 || chars == 0 {
            return;
        }
        *self.weights.entry(key).or_insert(0) += chars;
    }

    fn analyze(self, config: &LayoutConfig) -> FontStatistics {
        // Ascending iteration makes `max_by_key` keep the larger size on ties.
        let Some((&body_key, _)) = self.weights.iter().max_by_key(|(_, weight)| **weight) else {
            log::debug!(
                "no sized text, using default body size {}",
                config.default_body_size
            );
            return FontStatistics::with_body_size(config.default_body_size, config.heading_ratio);
        };

        let body_size = body_key as f32 / 10.0;
        let threshold = body_size * config.heading_ratio;
        let heading_sizes: Vec<f32> = self
            .weights
            .keys()
            .rev()
            .map(|k| *k as f32 / 10.0)
            .filter(|s| *s > threshold)
            .collect();

        log::debug!("body size {}, heading sizes {:?}", body_size, heading_sizes);

        FontStatistics {
            body_size,
            heading_sizes,
            heading_ratio: config.heading_ratio,
        }
    }
}
