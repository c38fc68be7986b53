use anyhow::{Result, Context, anyhow};
use log::{error, warn, info, debug};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use indicatif::{ProgressBar, ProgressStyle, MultiProgress};

use crate::app_config::Config;
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::layout::{LayoutContext, LayoutOrchestrator, LayoutResult};
use crate::providers::{FrameSource, SolidFrameSource};
use crate::subtitle_processor::SubtitleCollection;

// @module: Application controller for subtitle layout

/// Suffix inserted before the extension of layout output files
pub const LAYOUT_SUFFIX: &str = "layout";

/// Layouts for every cue of one subtitle file, as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    /// Subtitle file the layouts were computed for
    pub source: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub segments: Vec<LayoutResult>,
}

/// Main application controller for subtitle layout
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Shared layout collaborators
    context: Arc<LayoutContext>,

    // @field: Frame source; uniform frames from the config when unset
    frames: Option<Arc<dyn FrameSource>>,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_context(config, Arc::new(LayoutContext::default()))
    }

    /// Create a controller that lays out with the given collaborators
    pub fn with_context(config: Config, context: Arc<LayoutContext>) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        Ok(Self {
            config,
            context,
            frames: None,
        })
    }

    /// Sample backgrounds from `frames` instead of uniform frames
    pub fn with_frame_source(mut self, frames: Arc<dyn FrameSource>) -> Self {
        self.frames = Some(frames);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Lay out one subtitle file and write `<stem>.layout.json` into `output_dir`
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<()> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(&input_file, &output_dir, &multi_progress, force_overwrite)
            .await
            .map(|_| ())
    }

    /// Path of the layout file written for `input_file`
    pub fn layout_output_path(input_file: &Path, output_dir: &Path) -> PathBuf {
        FileManager::generate_output_path(input_file, output_dir, LAYOUT_SUFFIX, "json")
    }

    /// Returns the written path, or `None` when the file was skipped
    async fn run_with_progress(
        &self,
        input_file: &Path,
        output_dir: &Path,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<Option<PathBuf>> {
        if !FileManager::file_exists(input_file) {
            return Err(AppError::File(format!("Input file does not exist: {:?}", input_file)).into());
        }

        FileManager::ensure_dir(output_dir)?;

        let output_path = Self::layout_output_path(input_file, output_dir);
        if FileManager::file_exists(&output_path) && !force_overwrite {
            warn!("Skipping file, layout already exists (use -f to force overwrite)");
            return Ok(None);
        }

        let subtitles = SubtitleCollection::load(input_file)
            .context("Failed to parse subtitle file")?;

        let (layouts, elapsed) = self.layout_subtitles_with_progress(&subtitles, multi_progress).await?;

        let degraded = layouts.iter().filter(|layout| !layout.warnings.is_empty()).count();
        if degraded > 0 {
            warn!("{} of {} segments were laid out with warnings", degraded, layouts.len());
        }

        let written = self.save_layouts(layouts, input_file, output_dir)?;
        info!("Layout completed in {}.", Self::format_duration(elapsed));

        Ok(Some(written))
    }

    fn frame_source_for(&self, subtitles: &SubtitleCollection) -> Arc<dyn FrameSource> {
        if let Some(frames) = &self.frames {
            return frames.clone();
        }

        let duration = subtitles
            .entries
            .iter()
            .map(|entry| entry.end_seconds())
            .fold(0.0, f64::max);
        let run = &self.config.layout;

        Arc::new(SolidFrameSource::grey(
            run.frame_width,
            run.frame_height,
            duration,
            run.background_luma,
        ))
    }

    async fn layout_subtitles_with_progress(
        &self,
        subtitles: &SubtitleCollection,
        multi_progress: &MultiProgress,
    ) -> Result<(Vec<LayoutResult>, Duration)> {
        let start_time = Instant::now();
        let segments = subtitles.to_segments();

        let orchestrator = LayoutOrchestrator::new(
            self.context.clone(),
            self.config.style.clone(),
            self.frame_source_for(subtitles),
        )
        .map_err(AppError::from)?;

        let progress_bar = multi_progress.add(ProgressBar::new(segments.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} cues ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Laying out");

        debug!(
            "Laying out {} cues from {:?} with concurrency {}",
            segments.len(),
            subtitles.source_file,
            self.config.layout.concurrency
        );

        let pb = progress_bar.clone();
        let layouts = orchestrator
            .layout_all_with_progress(&segments, self.config.layout.concurrency, move |completed, _total| {
                pb.set_position(completed as u64);
            })
            .await?;

        progress_bar.finish_and_clear();

        Ok((layouts, start_time.elapsed()))
    }

    fn save_layouts(&self, layouts: Vec<LayoutResult>, input_file: &Path, output_dir: &Path) -> Result<PathBuf> {
        let output_path = Self::layout_output_path(input_file, output_dir);
        let (frame_width, frame_height) = match &self.frames {
            Some(frames) => frames.dimensions(),
            None => (self.config.layout.frame_width, self.config.layout.frame_height),
        };

        let document = LayoutDocument {
            source: input_file.to_string_lossy().to_string(),
            frame_width,
            frame_height,
            segments: layouts,
        };

        FileManager::write_json(&output_path, &document)?;

        info!("Success: {}", output_path.display());

        Ok(output_path)
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }

    /// Lay out every SRT file under a directory, writing each layout next to its file.
    /// Files that already have a layout are skipped unless forced.
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<()> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(AppError::File(format!("Input directory does not exist: {:?}", input_dir)).into());
        }

        let subtitle_files = FileManager::find_files(&input_dir, "srt")?;
        if subtitle_files.is_empty() {
            return Err(anyhow!("No subtitle files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();

        let folder_pb = multi_progress.add(ProgressBar::new(subtitle_files.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));
        folder_pb.set_message("Processing files");

        let mut success_count = 0;
        let mut error_count = 0;
        let mut skip_count = 0;

        for subtitle_file in subtitle_files.iter() {
            let file_name = subtitle_file.file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());

            folder_pb.set_message(format!("Processing: {}", file_name));

            let output_dir = match subtitle_file.parent() {
                Some(parent) => parent.to_path_buf(),
                None => input_dir.clone(),
            };

            match self.run_with_progress(subtitle_file, &output_dir, &multi_progress, force_overwrite).await {
                Ok(Some(_)) => success_count += 1,
                Ok(None) => skip_count += 1,
                Err(e) => {
                    error!("Error processing file {}: {}", file_name, e);
                    error_count += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        let duration = start_time.elapsed();
        let summary_message = format!("Folder processing completed: {} processed, {} skipped, {} errors",
             success_count, skip_count, error_count);
        info!("{}", summary_message);

        let log_file_path = input_dir.join("sublayout.issues.log");
        let log_entry = format!("{} ({}) - Duration: {}",
            summary_message,
            input_dir.display(),
            Self::format_duration(duration));

        if let Err(e) = FileManager::append_to_log_file(&log_file_path, &log_entry) {
            warn!("Failed to write folder logs to file: {}", e);
        } else {
            debug!("Folder processing logs written to {}", log_file_path.display());
        }

        Ok(())
    }
}
