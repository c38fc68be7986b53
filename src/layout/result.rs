/*!
 * Layout decisions handed to the renderer.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use super::zone::Zone;
use crate::providers::FontHandle;

/// One rendered line of a caption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutLine {
    pub text: String,
    /// Measured width in pixels
    pub width_px: f32,
    /// True when the line was accepted despite exceeding the maximum width
    pub forced: bool,
}

impl LayoutLine {
    pub fn new(text: impl Into<String>, width_px: f32, max_width_px: f32) -> Self {
        Self {
            text: text.into(),
            width_px,
            forced: width_px > max_width_px,
        }
    }
}

/// How the lines were produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStrategy {
    /// Minimum-cost wrapping within every constraint
    Optimal,
    /// Greedy wrapping after the optimal search found no solution
    Greedy,
    /// No text to lay out
    Empty,
}

/// Soft conditions recovered during layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutWarning {
    /// No wrapping fit the constraints; some content was force-accepted
    InfeasibleLayout { forced_lines: usize },
    /// The selected tokenizer failed and the regex tokenizer was used
    TokenizerFallback { strategy: String, reason: String },
    /// The configured font could not be resolved
    FontFallback { reason: String },
    /// No frame could be sampled; placement and colours use the defaults
    FrameUnavailable { reason: String },
    /// Face detection failed or timed out; zero faces were assumed
    FaceSamplerUnavailable { reason: String },
}

impl fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutWarning::InfeasibleLayout { forced_lines } => {
                write!(f, "infeasible layout, {} line(s) exceed the maximum width", forced_lines)
            }
            LayoutWarning::TokenizerFallback { strategy, reason } => {
                write!(f, "tokenizer '{}' failed ({}), used regex tokenizer", strategy, reason)
            }
            LayoutWarning::FontFallback { reason } => write!(f, "default font substituted: {}", reason),
            LayoutWarning::FrameUnavailable { reason } => write!(f, "frame unavailable: {}", reason),
            LayoutWarning::FaceSamplerUnavailable { reason } => {
                write!(f, "face detection skipped: {}", reason)
            }
        }
    }
}

/// Everything the renderer needs to draw one caption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub start: f64,
    pub end: f64,
    pub lines: Vec<LayoutLine>,
    pub line_height_px: u32,
    pub zone: Zone,
    pub margin_px: u32,
    /// Top edge of the background block in frame coordinates
    pub y_px: u32,
    pub block_width_px: u32,
    pub max_width_px: f32,
    pub text_height_px: u32,
    pub text_color: String,
    pub stroke_color: String,
    pub stroke_width: u32,
    pub background_enabled: bool,
    pub background_color: [u8; 3],
    pub background_opacity: f32,
    pub background_height_px: u32,
    /// Mean luma behind the block, when a frame was sampled
    pub luminance: Option<f32>,
    pub face_count: usize,
    pub strategy: LayoutStrategy,
    pub font: FontHandle,
    pub warnings: Vec<LayoutWarning>,
}

impl LayoutResult {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line texts in order
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|line| line.text.as_str()).collect()
    }

    /// Lines joined with newlines, as a renderer would draw them
    pub fn joined(&self) -> String {
        self.texts().join("\n")
    }
}
