use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;

use crate::errors::LayoutError;
use crate::layout::zone::Zone;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Subtitle style and layout tuning
    #[serde(default)]
    pub style: StyleConfig,

    /// Batch run settings
    #[serde(default)]
    pub layout: LayoutRunConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Settings for laying out a whole subtitle file
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LayoutRunConfig {
    /// Number of segments laid out in parallel
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Frame width used when no decoder is attached
    #[serde(default = "default_frame_width")]
    pub frame_width: u32,

    /// Frame height used when no decoder is attached
    #[serde(default = "default_frame_height")]
    pub frame_height: u32,

    /// Luma of the uniform frames used when no decoder is attached
    #[serde(default = "default_background_luma")]
    pub background_luma: u8,
}

impl Default for LayoutRunConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            frame_width: default_frame_width(),
            frame_height: default_frame_height(),
            background_luma: default_background_luma(),
        }
    }
}

/// Subtitle style options. Created once per run and never mutated.
///
/// Ratios that the engine clamps are read through the `effective_*` accessors;
/// the raw fields keep what the user wrote.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StyleConfig {
    // Font and block geometry
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    #[serde(default)]
    pub font_path: Option<String>,

    #[serde(default = "default_line_gap")]
    pub line_gap: u32,

    #[serde(default = "default_vertical_padding")]
    pub vertical_padding: u32,

    #[serde(default = "default_background_extra_padding")]
    pub background_extra_padding: u32,

    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,

    /// Block width as a fraction of frame width
    #[serde(default = "default_width_ratio")]
    pub width_ratio: f32,

    /// Text width as a fraction of block width (replaces horizontal padding when set)
    #[serde(default)]
    pub max_width_ratio: Option<f32>,

    /// Explicit maximum text width in pixels (overrides both ratios)
    #[serde(default)]
    pub max_width_px: Option<f32>,

    #[serde(default = "default_horizontal_padding")]
    pub horizontal_padding: u32,

    // Line breaking
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    #[serde(default = "default_ideal_width_ratio")]
    pub ideal_width_ratio: f64,

    #[serde(default = "default_short_line_length")]
    pub short_line_length: usize,

    #[serde(default = "default_short_line_penalty")]
    pub short_line_penalty: f64,

    #[serde(default = "default_punctuation_bonus")]
    pub punctuation_bonus: f64,

    #[serde(default = "default_no_punct_penalty")]
    pub no_punct_penalty: f64,

    #[serde(default = "default_balance_penalty")]
    pub balance_penalty: f64,

    /// Characters after which a line break reads naturally
    #[serde(default = "default_preferred_breaks")]
    pub preferred_breaks: String,

    /// Longest unbroken run, in characters, for scripts without spaces
    #[serde(default = "default_force_break_interval")]
    pub force_break_interval: usize,

    /// Ranked tokenizer strategy names, tried before the built-in ranking
    #[serde(default)]
    pub preferred_tokenizer: Vec<String>,

    // Placement
    /// Requested zone; `None` starts from the first priority entry
    #[serde(default)]
    pub position: Option<Zone>,

    #[serde(default = "default_margin")]
    pub margin: u32,

    #[serde(default = "default_true")]
    pub smart_positioning: bool,

    #[serde(default = "default_position_priority")]
    pub position_priority: Vec<Zone>,

    #[serde(default = "default_zone_split_top")]
    pub zone_split_top: f64,

    #[serde(default = "default_zone_split_mid")]
    pub zone_split_mid: f64,

    #[serde(default = "default_face_overlap_threshold")]
    pub face_overlap_threshold: f64,

    #[serde(default = "default_face_margin_extra")]
    pub face_margin_extra: u32,

    /// Time budget handed to the face sampler
    #[serde(default = "default_face_timeout_ms")]
    pub face_timeout_ms: u64,

    // Colours
    #[serde(default = "default_true")]
    pub adaptive_text_color: bool,

    #[serde(default = "default_true")]
    pub adaptive_background: bool,

    #[serde(default = "default_bright_threshold")]
    pub bright_threshold: f32,

    #[serde(default = "default_dark_threshold")]
    pub dark_threshold: f32,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_stroke_color")]
    pub stroke_color: String,

    #[serde(default = "default_bright_text_color")]
    pub bright_text_color: String,

    #[serde(default)]
    pub bright_stroke_color: Option<String>,

    #[serde(default)]
    pub dark_text_color: Option<String>,

    #[serde(default)]
    pub dark_stroke_color: Option<String>,

    #[serde(default = "default_true")]
    pub background: bool,

    #[serde(default = "default_background_color")]
    pub background_color: [u8; 3],

    #[serde(default = "default_background_opacity")]
    pub background_opacity: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_size: default_font_size(),
            font_path: None,
            line_gap: default_line_gap(),
            vertical_padding: default_vertical_padding(),
            background_extra_padding: default_background_extra_padding(),
            stroke_width: default_stroke_width(),
            width_ratio: default_width_ratio(),
            max_width_ratio: None,
            max_width_px: None,
            horizontal_padding: default_horizontal_padding(),
            max_lines: default_max_lines(),
            ideal_width_ratio: default_ideal_width_ratio(),
            short_line_length: default_short_line_length(),
            short_line_penalty: default_short_line_penalty(),
            punctuation_bonus: default_punctuation_bonus(),
            no_punct_penalty: default_no_punct_penalty(),
            balance_penalty: default_balance_penalty(),
            preferred_breaks: default_preferred_breaks(),
            force_break_interval: default_force_break_interval(),
            preferred_tokenizer: Vec::new(),
            position: None,
            margin: default_margin(),
            smart_positioning: true,
            position_priority: default_position_priority(),
            zone_split_top: default_zone_split_top(),
            zone_split_mid: default_zone_split_mid(),
            face_overlap_threshold: default_face_overlap_threshold(),
            face_margin_extra: default_face_margin_extra(),
            face_timeout_ms: default_face_timeout_ms(),
            adaptive_text_color: true,
            adaptive_background: true,
            bright_threshold: default_bright_threshold(),
            dark_threshold: default_dark_threshold(),
            color: default_color(),
            stroke_color: default_stroke_color(),
            bright_text_color: default_bright_text_color(),
            bright_stroke_color: None,
            dark_text_color: None,
            dark_stroke_color: None,
            background: true,
            background_color: default_background_color(),
            background_opacity: default_background_opacity(),
        }
    }
}

impl StyleConfig {
    /// Reject configurations that cannot produce any layout
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.max_lines < 1 {
            return Err(LayoutError::Configuration(format!(
                "max_lines must be at least 1, got {}",
                self.max_lines
            )));
        }

        if let Some(max_width) = self.max_width_px {
            if !max_width.is_finite() || max_width <= 0.0 {
                return Err(LayoutError::Configuration(format!(
                    "max_width_px must be a positive number, got {}",
                    max_width
                )));
            }
        }

        if self.font_size == 0 {
            return Err(LayoutError::Configuration("font_size must be positive".to_string()));
        }

        if self.force_break_interval == 0 {
            return Err(LayoutError::Configuration(
                "force_break_interval must be positive".to_string(),
            ));
        }

        if self.dark_threshold > self.bright_threshold {
            return Err(LayoutError::Configuration(format!(
                "dark_threshold ({}) must not exceed bright_threshold ({})",
                self.dark_threshold, self.bright_threshold
            )));
        }

        if !(0.0..=1.0).contains(&self.background_opacity) {
            return Err(LayoutError::Configuration(format!(
                "background_opacity must be within [0, 1], got {}",
                self.background_opacity
            )));
        }

        Ok(())
    }

    /// Line height: font size plus line gap
    pub fn line_height_px(&self) -> u32 {
        self.font_size.saturating_add(self.line_gap)
    }

    pub fn effective_width_ratio(&self) -> f32 {
        clamp_f32(self.width_ratio, 0.3, 1.0, default_width_ratio())
    }

    pub fn effective_max_width_ratio(&self) -> Option<f32> {
        self.max_width_ratio.map(|ratio| clamp_f32(ratio, 0.1, 1.0, 0.92))
    }

    pub fn effective_ideal_width_ratio(&self) -> f64 {
        clamp_f64(self.ideal_width_ratio, 0.3, 1.0, default_ideal_width_ratio())
    }

    pub fn effective_zone_split_top(&self) -> f64 {
        clamp_f64(self.zone_split_top, 0.2, 0.5, default_zone_split_top())
    }

    pub fn effective_zone_split_mid(&self) -> f64 {
        let top = self.effective_zone_split_top();
        clamp_f64(self.zone_split_mid, top + 0.05, 0.9, default_zone_split_mid())
    }

    pub fn effective_face_overlap_threshold(&self) -> f64 {
        clamp_f64(self.face_overlap_threshold, 0.1, 0.9, default_face_overlap_threshold())
    }

    /// Priority order, falling back to the default order when empty
    pub fn effective_position_priority(&self) -> Vec<Zone> {
        if self.position_priority.is_empty() {
            default_position_priority()
        } else {
            self.position_priority.clone()
        }
    }

    /// Block (background image) width for a frame of `frame_width` pixels
    pub fn block_width_px(&self, frame_width: u32) -> u32 {
        ((frame_width as f32 * self.effective_width_ratio()) as u32).max(100)
    }

    /// Maximum text width for a frame of `frame_width` pixels
    pub fn resolve_max_width_px(&self, frame_width: u32) -> f32 {
        if let Some(max_width) = self.max_width_px {
            return max_width;
        }

        let block_width = self.block_width_px(frame_width);
        match self.effective_max_width_ratio() {
            Some(ratio) => ((block_width as f32 * ratio) as u32).max(40) as f32,
            None => {
                let padding = self.horizontal_padding.min(block_width.saturating_sub(40));
                (block_width - padding).max(40) as f32
            }
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        self.style.validate()?;

        if self.layout.concurrency == 0 {
            return Err(anyhow!("layout.concurrency must be at least 1"));
        }

        if self.layout.frame_width == 0 || self.layout.frame_height == 0 {
            return Err(anyhow!(
                "Frame dimensions must be positive, got {}x{}",
                self.layout.frame_width,
                self.layout.frame_height
            ));
        }

        Ok(())
    }
}

fn clamp_f32(value: f32, minimum: f32, maximum: f32, fallback: f32) -> f32 {
    let value = if value.is_finite() { value } else { fallback };
    value.max(minimum).min(maximum)
}

fn clamp_f64(value: f64, minimum: f64, maximum: f64, fallback: f64) -> f64 {
    let value = if value.is_finite() { value } else { fallback };
    value.max(minimum).min(maximum)
}

fn default_concurrency() -> usize {
    4
}

fn default_frame_width() -> u32 {
    1080
}

fn default_frame_height() -> u32 {
    1920
}

fn default_background_luma() -> u8 {
    128
}

fn default_font_size() -> u32 {
    48
}

fn default_line_gap() -> u32 {
    10
}

fn default_vertical_padding() -> u32 {
    40
}

fn default_background_extra_padding() -> u32 {
    24
}

fn default_stroke_width() -> u32 {
    3
}

fn default_width_ratio() -> f32 {
    0.85
}

fn default_horizontal_padding() -> u32 {
    40
}

fn default_max_lines() -> usize {
    3
}

fn default_ideal_width_ratio() -> f64 {
    0.82
}

fn default_short_line_length() -> usize {
    4
}

fn default_short_line_penalty() -> f64 {
    0.6
}

fn default_punctuation_bonus() -> f64 {
    0.72
}

fn default_no_punct_penalty() -> f64 {
    0.3
}

fn default_balance_penalty() -> f64 {
    0.12
}

fn default_preferred_breaks() -> String {
    ".,!?…·;:-–—~".to_string()
}

fn default_force_break_interval() -> usize {
    8
}

fn default_margin() -> u32 {
    80
}

fn default_position_priority() -> Vec<Zone> {
    vec![Zone::Bottom, Zone::Top, Zone::Middle]
}

fn default_zone_split_top() -> f64 {
    0.35
}

fn default_zone_split_mid() -> f64 {
    0.65
}

fn default_face_overlap_threshold() -> f64 {
    0.38
}

fn default_face_margin_extra() -> u32 {
    60
}

fn default_face_timeout_ms() -> u64 {
    500
}

fn default_bright_threshold() -> f32 {
    190.0
}

fn default_dark_threshold() -> f32 {
    60.0
}

fn default_color() -> String {
    "white".to_string()
}

fn default_stroke_color() -> String {
    "black".to_string()
}

fn default_bright_text_color() -> String {
    "black".to_string()
}

fn default_background_color() -> [u8; 3] {
    [0, 0, 0]
}

fn default_background_opacity() -> f32 {
    0.7
}

fn default_true() -> bool {
    true
}
