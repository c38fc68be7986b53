/*!
 * Luminance-driven text colours and background opacity.
 */

use serde::{Deserialize, Serialize};

use crate::app_config::StyleConfig;

const BRIGHT_OPACITY_STEP: f32 = 0.25;
const DARK_OPACITY_STEP: f32 = 0.2;
const MIN_DARK_OPACITY: f32 = 0.35;

#[derive(Debug, Clone)]
pub struct StyleAdapterConfig {
    pub bright_threshold: f32,
    pub dark_threshold: f32,
    /// Whether colours follow the background; opacity always does
    pub adapt_colors: bool,
    pub text_color: String,
    pub stroke_color: String,
    pub bright_text_color: String,
    pub bright_stroke_color: String,
    pub dark_text_color: String,
    pub dark_stroke_color: String,
    pub background_opacity: f32,
}

impl StyleAdapterConfig {
    pub fn from_style(style: &StyleConfig) -> Self {
        let or_base = |value: &Option<String>, base: &str| value.clone().unwrap_or_else(|| base.to_string());

        Self {
            bright_threshold: style.bright_threshold,
            dark_threshold: style.dark_threshold,
            adapt_colors: style.adaptive_text_color,
            text_color: style.color.clone(),
            stroke_color: style.stroke_color.clone(),
            bright_text_color: style.bright_text_color.clone(),
            bright_stroke_color: or_base(&style.bright_stroke_color, &style.stroke_color),
            dark_text_color: or_base(&style.dark_text_color, &style.color),
            dark_stroke_color: or_base(&style.dark_stroke_color, &style.stroke_color),
            background_opacity: style.background_opacity,
        }
    }
}

impl Default for StyleAdapterConfig {
    fn default() -> Self {
        Self::from_style(&StyleConfig::default())
    }
}

/// Background class of a sampled luminance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Brightness {
    Bright,
    Dark,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDecision {
    pub text_color: String,
    pub stroke_color: String,
    pub background_opacity: f32,
    pub brightness: Brightness,
}

#[derive(Debug, Clone, Default)]
pub struct StyleAdapter {
    config: StyleAdapterConfig,
}

impl StyleAdapter {
    pub fn new(config: StyleAdapterConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, luminance: f32) -> Brightness {
        if luminance > self.config.bright_threshold {
            Brightness::Bright
        } else if luminance < self.config.dark_threshold {
            Brightness::Dark
        } else {
            Brightness::Neutral
        }
    }

    /// Pick colours and opacity for the luminance behind the block.
    ///
    /// Without a luminance the base style is returned unchanged.
    pub fn adapt(&self, luminance: Option<f32>) -> StyleDecision {
        let cfg = &self.config;
        let brightness = luminance.map_or(Brightness::Neutral, |l| self.classify(l));

        let (text_color, stroke_color, background_opacity) = match brightness {
            Brightness::Bright => (
                &cfg.bright_text_color,
                &cfg.bright_stroke_color,
                (cfg.background_opacity + BRIGHT_OPACITY_STEP).min(1.0),
            ),
            Brightness::Dark => (
                &cfg.dark_text_color,
                &cfg.dark_stroke_color,
                (cfg.background_opacity - DARK_OPACITY_STEP).max(MIN_DARK_OPACITY),
            ),
            Brightness::Neutral => (&cfg.text_color, &cfg.stroke_color, cfg.background_opacity),
        };

        let (text_color, stroke_color) = if cfg.adapt_colors {
            (text_color.clone(), stroke_color.clone())
        } else {
            (cfg.text_color.clone(), cfg.stroke_color.clone())
        };

        StyleDecision {
            text_color,
            stroke_color,
            background_opacity,
            brightness,
        }
    }
}
