/*!
 * Face sampler that reports a fixed set of boxes.
 */

use std::time::Duration;

use super::{FaceBox, FaceSampler, Frame};
use crate::errors::CollaboratorError;

/// Returns the same boxes for every frame, dropping any outside the frame
#[derive(Debug, Clone, Default)]
pub struct StaticFaceSampler {
    faces: Vec<FaceBox>,
}

impl StaticFaceSampler {
    pub fn new(faces: Vec<FaceBox>) -> Self {
        Self { faces }
    }

    /// Parse an `x,y,w,h` box as given on the command line
    pub fn parse_box(value: &str) -> Result<FaceBox, CollaboratorError> {
        let parts: Vec<u32> = value
            .split(',')
            .map(|part| part.trim().parse::<u32>())
            .collect::<Result<_, _>>()
            .map_err(|e| CollaboratorError::Failed(format!("invalid face box '{}': {}", value, e)))?;

        match parts.as_slice() {
            [x, y, w, h] => Ok(FaceBox::new(*x, *y, *w, *h)),
            _ => Err(CollaboratorError::Failed(format!(
                "invalid face box '{}': expected x,y,w,h",
                value
            ))),
        }
    }
}

impl FaceSampler for StaticFaceSampler {
    fn name(&self) -> &str {
        "static"
    }

    fn detect(&self, frame: &Frame, _budget: Duration) -> Result<Vec<FaceBox>, CollaboratorError> {
        Ok(self
            .faces
            .iter()
            .copied()
            .filter(|face| face.x < frame.width() && face.y < frame.height())
            .collect())
    }
}
