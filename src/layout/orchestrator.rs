/*!
 * One-call layout of a caption segment.
 *
 * The orchestrator wires the tokenizer, line-break planner, zone selector and
 * style adapter together around a frame source. Configuration errors are
 * reported once, when the orchestrator is built. After that, `layout` always
 * returns a result: collaborator failures degrade to defaults and are recorded
 * as warnings on the result.
 */

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use log::{debug, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::context::LayoutContext;
use super::line_break::{LineBreakConfig, LineBreakPlan, LineBreakPlanner};
use super::result::{LayoutResult, LayoutStrategy, LayoutWarning};
use super::segment::CaptionSegment;
use super::style::{StyleAdapter, StyleAdapterConfig};
use super::tokenizer::{tokenize_with_fallback, RegexTokenizer};
use super::zone::{Zone, ZoneSelector, ZoneSelectorConfig};
use crate::app_config::StyleConfig;
use crate::errors::{CollaboratorError, LayoutError};
use crate::providers::{FaceBox, FontHandle, Frame, FrameSource};

/// Lays out caption segments against one media source
#[derive(Debug, Clone)]
pub struct LayoutOrchestrator {
    context: Arc<LayoutContext>,
    frames: Arc<dyn FrameSource>,
    style: Arc<StyleConfig>,
    font: FontHandle,
    font_warning: Option<LayoutWarning>,
    regex_tokenizer: RegexTokenizer,
    planner: LineBreakPlanner,
    zone_selector: ZoneSelector,
    style_adapter: StyleAdapter,
}

/// Zone, margin and background sample chosen for one segment
struct Placement {
    zone: Zone,
    margin_px: u32,
    frame_height: u32,
    luminance: Option<f32>,
    face_count: usize,
}

impl LayoutOrchestrator {
    /// Validate `style` and prepare the components for `frames`
    pub fn new(context: Arc<LayoutContext>, style: StyleConfig, frames: Arc<dyn FrameSource>) -> Result<Self, LayoutError> {
        style.validate()?;

        let (frame_width, frame_height) = frames.dimensions();
        if frame_width == 0 || frame_height == 0 {
            return Err(LayoutError::Configuration(format!(
                "frame dimensions must be positive, got {}x{}",
                frame_width, frame_height
            )));
        }

        let max_width_px = style.resolve_max_width_px(frame_width);

        let (font, font_warning) = match context.font_provider().resolve(&style) {
            Ok(font) => (font, None),
            Err(e) => {
                debug!("Using default font: {}", e);
                (
                    FontHandle::default_with_size(style.font_size),
                    Some(LayoutWarning::FontFallback { reason: e.to_string() }),
                )
            }
        };

        debug!(
            "Layout for {}x{} frames: max width {:.0}px, {} line(s), font {}",
            frame_width, frame_height, max_width_px, style.max_lines, font.source
        );

        Ok(Self {
            regex_tokenizer: RegexTokenizer::new(&style.preferred_breaks, style.force_break_interval),
            planner: LineBreakPlanner::new(LineBreakConfig::from_style(&style, max_width_px)),
            zone_selector: ZoneSelector::new(ZoneSelectorConfig::from_style(&style)),
            style_adapter: StyleAdapter::new(StyleAdapterConfig::from_style(&style)),
            style: Arc::new(style),
            context,
            frames,
            font,
            font_warning,
        })
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn font(&self) -> &FontHandle {
        &self.font
    }

    pub fn max_width_px(&self) -> f32 {
        self.planner.config().max_width_px
    }

    /// Lay out one segment. Never fails; degraded steps are listed in `warnings`.
    pub fn layout(&self, segment: &CaptionSegment) -> LayoutResult {
        let mut warnings: Vec<LayoutWarning> = self.font_warning.iter().cloned().collect();

        let strategy = self.context.tokenizer(&self.style.preferred_tokenizer);
        let (tokenization, tokenizer_error) =
            tokenize_with_fallback(&segment.text, strategy.as_ref(), &self.regex_tokenizer);
        if let (Some(strategy), Some(error)) = (&strategy, tokenizer_error) {
            warnings.push(LayoutWarning::TokenizerFallback {
                strategy: strategy.name().to_string(),
                reason: error.to_string(),
            });
        }

        let plan = self.planner.plan(&tokenization, self.context.measurer(), &self.font);
        if plan.strategy == LayoutStrategy::Greedy {
            warnings.push(LayoutWarning::InfeasibleLayout {
                forced_lines: plan.forced_lines(),
            });
        }

        if plan.strategy == LayoutStrategy::Empty {
            debug!("Segment {} has no text, returning empty layout", segment.seq_num);
            let placement = self.default_placement(self.frames.dimensions().1);
            return self.assemble(segment, plan, placement, warnings);
        }

        let (_, background_height) = self.block_heights(plan.lines.len());
        let placement = self.place(segment, background_height, &mut warnings);
        self.assemble(segment, plan, placement, warnings)
    }

    /// Lay out segments in parallel, returning results in input order
    pub async fn layout_all(&self, segments: &[CaptionSegment], concurrency: usize) -> Result<Vec<LayoutResult>> {
        self.layout_all_with_progress(segments, concurrency, |_, _| {}).await
    }

    /// Like `layout_all`, reporting `(done, total)` after each segment
    pub async fn layout_all_with_progress(
        &self,
        segments: &[CaptionSegment],
        concurrency: usize,
        progress_callback: impl Fn(usize, usize) + Clone + Send + 'static,
    ) -> Result<Vec<LayoutResult>> {
        let total = segments.len();
        let processed = Arc::new(AtomicUsize::new(0));

        let mut results = stream::iter(segments.iter().cloned().enumerate())
            .map(|(index, segment)| {
                let orchestrator = self.clone();
                let processed = processed.clone();
                let progress_callback = progress_callback.clone();

                async move {
                    let result = tokio::task::spawn_blocking(move || orchestrator.layout(&segment)).await;

                    let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress_callback(current, total);

                    (index, result)
                }
            })
            .buffer_unordered(concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        results.sort_by_key(|(index, _)| *index);

        results
            .into_iter()
            .map(|(index, result)| result.with_context(|| format!("Layout task for segment {} panicked", index + 1)))
            .collect()
    }

    /// Text block and background heights for `line_count` lines
    fn block_heights(&self, line_count: usize) -> (u32, u32) {
        let text_height = u32::try_from(line_count)
            .unwrap_or(u32::MAX)
            .saturating_mul(self.style.line_height_px())
            .saturating_add(self.style.vertical_padding);
        (text_height, text_height.saturating_add(self.style.background_extra_padding))
    }

    fn default_placement(&self, frame_height: u32) -> Placement {
        Placement {
            zone: self
                .style
                .position
                .unwrap_or_else(|| self.zone_selector.config().default_zone()),
            margin_px: self.style.margin,
            frame_height,
            luminance: None,
            face_count: 0,
        }
    }

    fn place(&self, segment: &CaptionSegment, background_height: u32, warnings: &mut Vec<LayoutWarning>) -> Placement {
        let (_, frame_height) = self.frames.dimensions();
        if !self.style.smart_positioning && !self.style.adaptive_background {
            return self.default_placement(frame_height);
        }

        let time = segment.sample_time(self.frames.duration());
        let frame = match self.frames.sample_at(time) {
            Ok(frame) => frame,
            Err(e) => {
                debug!("No frame for segment {} at {:.2}s: {}", segment.seq_num, time, e);
                warnings.push(LayoutWarning::FrameUnavailable { reason: e.to_string() });
                return self.default_placement(frame_height);
            }
        };

        let mut placement = self.default_placement(frame.height());

        if self.style.smart_positioning {
            let faces = self.detect_faces(&frame, warnings);
            let decision =
                self.zone_selector
                    .select(&faces, frame.height(), self.style.position, self.style.margin);
            debug!(
                "Segment {}: {} face(s), zone {} (overlap {:.2})",
                segment.seq_num,
                faces.len(),
                decision.zone,
                decision.overlap_ratio
            );
            placement.zone = decision.zone;
            placement.margin_px = decision.margin_px;
            placement.face_count = faces.len();
        }

        if self.style.adaptive_background {
            let (start, end) = placement
                .zone
                .block_rows(frame.height(), background_height, placement.margin_px);
            placement.luminance = Some(frame.mean_luminance(start, end));
        }

        placement
    }

    fn detect_faces(&self, frame: &Frame, warnings: &mut Vec<LayoutWarning>) -> Vec<FaceBox> {
        let Some(sampler) = self.context.face_sampler() else {
            return Vec::new();
        };

        let budget = Duration::from_millis(self.style.face_timeout_ms);
        let started = Instant::now();
        let outcome = sampler.detect(frame, budget).and_then(|faces| {
            if started.elapsed() > budget {
                Err(CollaboratorError::Timeout {
                    name: sampler.name().to_string(),
                    budget_ms: self.style.face_timeout_ms,
                })
            } else {
                Ok(faces)
            }
        });

        match outcome {
            Ok(faces) => faces,
            Err(e) => {
                warn!("Face detection degraded to zero faces: {}", e);
                warnings.push(LayoutWarning::FaceSamplerUnavailable { reason: e.to_string() });
                Vec::new()
            }
        }
    }

    fn assemble(
        &self,
        segment: &CaptionSegment,
        plan: LineBreakPlan,
        placement: Placement,
        warnings: Vec<LayoutWarning>,
    ) -> LayoutResult {
        let style = &self.style;
        let (text_height, background_height) = self.block_heights(plan.lines.len());
        let decision = self.style_adapter.adapt(placement.luminance);
        let (frame_width, _) = self.frames.dimensions();

        LayoutResult {
            start: segment.start,
            end: segment.end,
            lines: plan.lines,
            line_height_px: style.line_height_px(),
            zone: placement.zone,
            margin_px: placement.margin_px,
            y_px: placement
                .zone
                .block_top(placement.frame_height, background_height, placement.margin_px),
            block_width_px: style.block_width_px(frame_width),
            max_width_px: self.max_width_px(),
            text_height_px: text_height,
            text_color: decision.text_color,
            stroke_color: decision.stroke_color,
            stroke_width: style.stroke_width,
            background_enabled: style.background,
            background_color: style.background_color,
            background_opacity: decision.background_opacity,
            background_height_px: background_height,
            luminance: placement.luminance,
            face_count: placement.face_count,
            strategy: plan.strategy,
            font: self.font.clone(),
            warnings,
        }
    }
}
