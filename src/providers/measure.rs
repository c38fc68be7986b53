/*!
 * Text measurement based on Unicode display width.
 */

use unicode_width::UnicodeWidthStr;

use super::{FontHandle, TextMeasurer};

/// Measures text as `cells * size_px * cell_ratio`.
///
/// A cell is one column of `unicode-width`: Latin letters are one cell,
/// Hangul and CJK ideographs are two. With the default ratio of 0.5 a
/// Hangul syllable is exactly one em wide.
#[derive(Debug, Clone)]
pub struct CellWidthMeasurer {
    cell_ratio: f32,
}

impl CellWidthMeasurer {
    pub fn new() -> Self {
        Self { cell_ratio: 0.5 }
    }

    /// Use a custom width per cell, as a fraction of the font size
    pub fn with_cell_ratio(cell_ratio: f32) -> Self {
        Self { cell_ratio }
    }
}

impl Default for CellWidthMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasurer for CellWidthMeasurer {
    fn measure(&self, font: &FontHandle, text: &str) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        UnicodeWidthStr::width(text) as f32 * font.size_px as f32 * self.cell_ratio
    }
}
