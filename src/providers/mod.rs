/*!
 * External capabilities consumed by the layout engine.
 *
 * The engine never decodes video, rasterizes glyphs or runs a face detector
 * itself. It talks to those capabilities through the traits below:
 * - `TextMeasurer`: font + string -> rendered width in pixels
 * - `FontProvider`: style configuration -> font handle
 * - `FaceSampler`: frame -> face boxes, within a time budget
 * - `FrameSource`: time -> decoded RGB frame
 *
 * Reference implementations live in the submodules so the engine can run
 * end-to-end without a host application:
 * - `measure`: Unicode cell-width measurer
 * - `font`: candidate font file resolver
 * - `frames`: solid-colour frame source
 * - `faces`: static face sampler
 */

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

use crate::app_config::StyleConfig;
use crate::errors::CollaboratorError;

pub mod faces;
pub mod font;
pub mod frames;
pub mod measure;

pub use faces::StaticFaceSampler;
pub use font::CandidateFontProvider;
pub use frames::SolidFrameSource;
pub use measure::CellWidthMeasurer;

/// A resolved font: where it came from and the pixel size it is used at
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontHandle {
    /// Font file path, or "default" for the built-in fallback
    pub source: String,
    /// Pixel size
    pub size_px: u32,
}

impl FontHandle {
    /// Name used for the built-in fallback font
    pub const DEFAULT_SOURCE: &'static str = "default";

    /// The fallback font substituted when resolution fails
    pub fn default_with_size(size_px: u32) -> Self {
        Self {
            source: Self::DEFAULT_SOURCE.to_string(),
            size_px,
        }
    }
}

/// Measures rendered text width. Must be pure and deterministic.
pub trait TextMeasurer: Send + Sync + Debug {
    /// Width in pixels of `text` rendered with `font`
    fn measure(&self, font: &FontHandle, text: &str) -> f32;
}

/// Resolves the font to use for a style
pub trait FontProvider: Send + Sync + Debug {
    /// Resolve the configured font. On error the orchestrator substitutes the default font.
    fn resolve(&self, style: &StyleConfig) -> Result<FontHandle, CollaboratorError>;
}

/// Face bounding box in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl FaceBox {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Area in square pixels
    pub fn area(&self) -> f64 {
        f64::from(self.w) * f64::from(self.h)
    }

    /// Vertical centre
    pub fn center_y(&self) -> f64 {
        f64::from(self.y) + f64::from(self.h) / 2.0
    }
}

/// Detects faces in a frame
pub trait FaceSampler: Send + Sync + Debug {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Detect faces, honouring `budget`. Errors and overruns degrade to zero faces.
    fn detect(&self, frame: &Frame, budget: Duration) -> Result<Vec<FaceBox>, CollaboratorError>;
}

/// Read-only access to the frames of the media being captioned
pub trait FrameSource: Send + Sync + Debug {
    /// Frame width and height in pixels
    fn dimensions(&self) -> (u32, u32);

    /// Media duration in seconds
    fn duration(&self) -> f64;

    /// Decode the frame shown at `time` seconds
    fn sample_at(&self, time: f64) -> Result<Frame, CollaboratorError>;
}

/// A decoded RGB frame, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 3]>,
}

impl Frame {
    /// Build a frame from row-major RGB pixels
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<[u8; 3]>) -> Result<Self, CollaboratorError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(CollaboratorError::Failed(format!(
                "frame buffer holds {} pixels, expected {}x{}={}",
                pixels.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self { width, height, pixels })
    }

    /// A frame filled with one colour
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self {
            width,
            height,
            pixels: vec![rgb; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Overwrite the rows in `y_start..y_end` with `rgb`
    pub fn fill_rows(&mut self, y_start: u32, y_end: u32, rgb: [u8; 3]) {
        let y_end = y_end.min(self.height);
        let row = self.width as usize;
        for y in y_start.min(y_end)..y_end {
            let start = y as usize * row;
            self.pixels[start..start + row].fill(rgb);
        }
    }

    /// Perceptual luma of one pixel (Rec. 709 weights)
    pub fn luma(rgb: [u8; 3]) -> f32 {
        0.2126 * f32::from(rgb[0]) + 0.7152 * f32::from(rgb[1]) + 0.0722 * f32::from(rgb[2])
    }

    /// Mean luma over full-width rows `y_start..y_end`.
    ///
    /// An empty or out-of-frame row range samples the whole frame.
    /// An empty frame has luminance 0.
    pub fn mean_luminance(&self, y_start: u32, y_end: u32) -> f32 {
        if self.pixels.is_empty() {
            return 0.0;
        }

        let y_end = y_end.min(self.height);
        let y_start = y_start.min(y_end);
        let row = self.width as usize;
        let region = if y_end > y_start {
            &self.pixels[y_start as usize * row..y_end as usize * row]
        } else {
            &self.pixels[..]
        };

        let total: f64 = region.iter().map(|px| f64::from(Self::luma(*px))).sum();
        (total / region.len() as f64) as f32
    }
}
