/*!
 * Frame source producing uniform frames, for runs without a video decoder.
 */

use super::{Frame, FrameSource};
use crate::errors::CollaboratorError;

/// Every sampled frame is the same solid colour
#[derive(Debug, Clone)]
pub struct SolidFrameSource {
    width: u32,
    height: u32,
    duration: f64,
    rgb: [u8; 3],
}

impl SolidFrameSource {
    pub fn new(width: u32, height: u32, duration: f64, rgb: [u8; 3]) -> Self {
        Self {
            width,
            height,
            duration,
            rgb,
        }
    }

    /// Grey frames whose luma equals `luma`
    pub fn grey(width: u32, height: u32, duration: f64, luma: u8) -> Self {
        Self::new(width, height, duration, [luma, luma, luma])
    }
}

impl FrameSource for SolidFrameSource {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn sample_at(&self, time: f64) -> Result<Frame, CollaboratorError> {
        if !time.is_finite() || time < 0.0 {
            return Err(CollaboratorError::Failed(format!("invalid sample time {}", time)));
        }
        Ok(Frame::solid(self.width, self.height, self.rgb))
    }
}
