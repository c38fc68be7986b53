/*!
 * Font resolution from a ranked list of candidate font files.
 */

use log::debug;
use std::path::{Path, PathBuf};

use super::{FontHandle, FontProvider};
use crate::app_config::StyleConfig;
use crate::errors::CollaboratorError;

/// Fonts with good Hangul coverage, tried after the configured `font_path`
const DEFAULT_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/nanum/NanumGothic.ttf",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/System/Library/Fonts/AppleSDGothicNeo.ttc",
    "C:/Windows/Fonts/NanumGothic.ttf",
    "C:/Windows/Fonts/malgun.ttf",
    "C:/Windows/Fonts/gulim.ttc",
    "C:/Windows/Fonts/arial.ttf",
];

/// Picks the first candidate font file that exists on disk
#[derive(Debug, Clone)]
pub struct CandidateFontProvider {
    candidates: Vec<PathBuf>,
}

impl CandidateFontProvider {
    /// Provider using the built-in candidate list
    pub fn new() -> Self {
        Self::with_candidates(DEFAULT_FONT_CANDIDATES.iter().map(PathBuf::from).collect())
    }

    /// Provider using a custom candidate list
    pub fn with_candidates(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }
}

impl Default for CandidateFontProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FontProvider for CandidateFontProvider {
    fn resolve(&self, style: &StyleConfig) -> Result<FontHandle, CollaboratorError> {
        let configured = style.font_path.as_deref().map(Path::new);

        for path in configured.into_iter().chain(self.candidates.iter().map(PathBuf::as_path)) {
            if path.is_file() {
                debug!("Using font: {}", path.display());
                return Ok(FontHandle {
                    source: path.to_string_lossy().to_string(),
                    size_px: style.font_size,
                });
            }
        }

        Err(CollaboratorError::unavailable(
            "font",
            format!("none of {} candidate fonts exist", self.candidates.len() + usize::from(configured.is_some())),
        ))
    }
}
