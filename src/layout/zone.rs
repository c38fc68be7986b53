/*!
 * Face-aware vertical placement of the subtitle block.
 *
 * Faces are bucketed into three horizontal bands by their vertical centre.
 * Each band's score is 1.0 plus the face area it contains, and the selector
 * walks the priority order looking for a band that is clearly emptier than
 * the current choice.
 *
 * The switching margin is one raw pixel-area unit. Face areas grow with the
 * square of the resolution, so at 1080p this margin is negligible and near-ties
 * switch zones almost as eagerly as with no margin at all. It is kept as-is
 * to preserve the established placement behaviour.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::app_config::StyleConfig;
use crate::providers::FaceBox;

/// Smoothing score every zone starts with
const BASE_ZONE_SCORE: f64 = 1.0;

/// How much lower a candidate's score must be before the selector switches to it.
///
/// Scores are raw pixel areas, so this margin shrinks in effect as the frame
/// resolution grows.
const HYSTERESIS_MARGIN: f64 = 1.0;

/// Vertical screen region that can hold the subtitle block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Top,
    #[serde(alias = "center")]
    Middle,
    Bottom,
}

impl Zone {
    pub const ALL: [Zone; 3] = [Zone::Top, Zone::Middle, Zone::Bottom];

    fn index(self) -> usize {
        match self {
            Zone::Top => 0,
            Zone::Middle => 1,
            Zone::Bottom => 2,
        }
    }

    /// Top edge of a block of `block_height` placed in this zone
    pub fn block_top(self, frame_height: u32, block_height: u32, margin: u32) -> u32 {
        match self {
            Zone::Top => margin,
            Zone::Middle => frame_height.saturating_sub(block_height) / 2,
            Zone::Bottom => frame_height.saturating_sub(block_height).saturating_sub(margin),
        }
    }

    /// Rows covered by a block of `block_height` placed in this zone, clamped to the frame
    pub fn block_rows(self, frame_height: u32, block_height: u32, margin: u32) -> (u32, u32) {
        match self {
            Zone::Top => {
                let start = margin.min(frame_height);
                (start, start.saturating_add(block_height).min(frame_height))
            }
            Zone::Middle => {
                let start = (frame_height / 2).saturating_sub(block_height / 2);
                (start, start.saturating_add(block_height).min(frame_height))
            }
            Zone::Bottom => {
                let end = frame_height.saturating_sub(margin);
                (end.saturating_sub(block_height), end)
            }
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Zone::Top => "top",
            Zone::Middle => "middle",
            Zone::Bottom => "bottom",
        };
        write!(f, "{}", name)
    }
}

/// Per-zone face coverage scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneScores([f64; 3]);

impl ZoneScores {
    /// All zones at the smoothing score
    pub fn baseline() -> Self {
        Self([BASE_ZONE_SCORE; 3])
    }

    /// Explicit scores, mostly useful for tests and diagnostics
    pub fn new(top: f64, middle: f64, bottom: f64) -> Self {
        Self([top, middle, bottom])
    }

    pub fn get(&self, zone: Zone) -> f64 {
        self.0[zone.index()]
    }

    pub fn add(&mut self, zone: Zone, area: f64) {
        self.0[zone.index()] += area;
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

/// Configuration for zone selection
#[derive(Debug, Clone)]
pub struct ZoneSelectorConfig {
    /// Fraction of frame height where the top band ends
    pub split_top: f64,
    /// Fraction of frame height where the middle band ends
    pub split_mid: f64,
    /// Zones in the order they are considered
    pub priority: Vec<Zone>,
    /// Overlap ratio above which the margin grows
    pub overlap_threshold: f64,
    /// Margin added when the chosen zone still overlaps faces
    pub margin_extra: u32,
}

impl Default for ZoneSelectorConfig {
    fn default() -> Self {
        Self::from_style(&StyleConfig::default())
    }
}

impl ZoneSelectorConfig {
    pub fn from_style(style: &StyleConfig) -> Self {
        Self {
            split_top: style.effective_zone_split_top(),
            split_mid: style.effective_zone_split_mid(),
            priority: style.effective_position_priority(),
            overlap_threshold: style.effective_face_overlap_threshold(),
            margin_extra: style.face_margin_extra,
        }
    }

    /// Zone used when none is requested
    pub fn default_zone(&self) -> Zone {
        self.priority.first().copied().unwrap_or(Zone::Bottom)
    }
}

/// Outcome of zone selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDecision {
    pub zone: Zone,
    pub margin_px: u32,
    pub scores: ZoneScores,
    pub overlap_ratio: f64,
}

/// Chooses the zone that keeps the subtitle block off detected faces
#[derive(Debug, Clone, Default)]
pub struct ZoneSelector {
    config: ZoneSelectorConfig,
}

impl ZoneSelector {
    pub fn new(config: ZoneSelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ZoneSelectorConfig {
        &self.config
    }

    /// Bucket faces into zones by vertical centre and accumulate their areas
    pub fn score_faces(&self, faces: &[FaceBox], frame_height: u32) -> ZoneScores {
        let top_border = (f64::from(frame_height) * self.config.split_top).floor();
        let mid_border = (f64::from(frame_height) * self.config.split_mid).floor();

        let mut scores = ZoneScores::baseline();
        for face in faces {
            let cy = face.center_y();
            let zone = if cy < top_border {
                Zone::Top
            } else if cy < mid_border {
                Zone::Middle
            } else {
                Zone::Bottom
            };
            scores.add(zone, face.area());
        }
        scores
    }

    /// Pick a zone for the detected faces.
    ///
    /// `requested` is where the caller would like the block; `None` means the
    /// first priority entry. `base_margin` is the margin before any face padding.
    pub fn select(
        &self,
        faces: &[FaceBox],
        frame_height: u32,
        requested: Option<Zone>,
        base_margin: u32,
    ) -> ZoneDecision {
        let scores = self.score_faces(faces, frame_height);
        let current = requested.unwrap_or_else(|| self.config.default_zone());
        self.select_from_scores(scores, current, base_margin)
    }

    /// Apply hysteresis and the overlap margin to precomputed scores
    pub fn select_from_scores(&self, scores: ZoneScores, current: Zone, base_margin: u32) -> ZoneDecision {
        let mut zone = current;
        let mut current_score = scores.get(current);

        for candidate in &self.config.priority {
            let score = scores.get(*candidate);
            if score < current_score - HYSTERESIS_MARGIN {
                current_score = score;
                zone = *candidate;
            }
        }

        let total = scores.total();
        let overlap_ratio = if total > 0.0 { scores.get(zone) / total } else { 0.0 };

        let margin_px = if overlap_ratio > self.config.overlap_threshold {
            base_margin.saturating_add(self.config.margin_extra)
        } else {
            base_margin
        };

        ZoneDecision {
            zone,
            margin_px,
            scores,
            overlap_ratio,
        }
    }
}
