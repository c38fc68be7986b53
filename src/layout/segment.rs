use serde::{Deserialize, Serialize};

/// A time-coded caption, as produced upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSegment {
    /// Cue index in the source subtitle file
    pub seq_num: usize,
    pub text: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

impl CaptionSegment {
    pub fn new(seq_num: usize, text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            seq_num,
            text: text.into(),
            start,
            end,
        }
    }

    /// Time to sample the background at: the midpoint, clamped into the media
    pub fn sample_time(&self, duration: f64) -> f64 {
        let latest = if duration.is_finite() { (duration - 0.05).max(0.0) } else { 0.0 };
        let midpoint = (self.start + self.end) / 2.0;
        if midpoint.is_finite() {
            midpoint.clamp(0.0, latest)
        } else {
            0.0
        }
    }
}
