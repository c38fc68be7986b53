/*!
 * Multi-line wrapping of caption text.
 *
 * The planner searches break points for the fewest lines that fit the maximum
 * width, choosing among them the wrapping with the lowest total line cost. Line
 * cost favours lines near the ideal width, ending on punctuation, and not too
 * short. When no wrapping fits (a single unit wider than the line, or too much
 * text for the line limit) a greedy pass fills lines left to right and lets the
 * last line absorb whatever remains.
 */

use log::warn;

use super::result::{LayoutLine, LayoutStrategy};
use super::tokenizer::Tokenization;
use crate::app_config::StyleConfig;
use crate::providers::{FontHandle, TextMeasurer};

/// Constraints and cost weights for line breaking
#[derive(Debug, Clone)]
pub struct LineBreakConfig {
    pub max_lines: usize,
    pub max_width_px: f32,
    pub ideal_width_ratio: f64,
    /// Lines with at most this many characters are penalised
    pub short_line_length: usize,
    pub short_line_penalty: f64,
    /// Multiplier for non-final lines ending on a preferred break character
    pub punctuation_bonus: f64,
    /// Added to non-final lines that do not end on a preferred break character
    pub no_punct_penalty: f64,
    pub balance_penalty: f64,
    pub preferred_breaks: Vec<char>,
}

impl LineBreakConfig {
    pub fn from_style(style: &StyleConfig, max_width_px: f32) -> Self {
        Self {
            max_lines: style.max_lines.max(1),
            max_width_px,
            ideal_width_ratio: style.effective_ideal_width_ratio(),
            short_line_length: style.short_line_length,
            short_line_penalty: style.short_line_penalty,
            punctuation_bonus: style.punctuation_bonus,
            no_punct_penalty: style.no_punct_penalty,
            balance_penalty: style.balance_penalty,
            preferred_breaks: style.preferred_breaks.chars().collect(),
        }
    }
}

/// Wrapped lines and how they were found
#[derive(Debug, Clone, PartialEq)]
pub struct LineBreakPlan {
    pub lines: Vec<LayoutLine>,
    pub strategy: LayoutStrategy,
    /// Total line cost of an optimal plan
    pub cost: Option<f64>,
}

impl LineBreakPlan {
    fn empty() -> Self {
        Self {
            lines: Vec::new(),
            strategy: LayoutStrategy::Empty,
            cost: None,
        }
    }

    /// Number of lines accepted over the maximum width
    pub fn forced_lines(&self) -> usize {
        self.lines.iter().filter(|line| line.forced).count()
    }
}

#[derive(Debug, Clone)]
pub struct LineBreakPlanner {
    config: LineBreakConfig,
}

impl LineBreakPlanner {
    pub fn new(config: LineBreakConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LineBreakConfig {
        &self.config
    }

    /// Cost of one line of measured `width`.
    ///
    /// `text` must already be trimmed; its length counts characters.
    pub fn line_cost(&self, width: f32, text: &str, is_last: bool) -> f64 {
        let cfg = &self.config;
        let max_width = f64::from(cfg.max_width_px);
        let deviation = (f64::from(width) - max_width * cfg.ideal_width_ratio) / max_width;
        let mut cost = deviation * deviation;

        let length = text.chars().count();
        if length <= cfg.short_line_length {
            cost += cfg.short_line_penalty;
        }

        if !is_last {
            let ends_on_break = text
                .chars()
                .last()
                .is_some_and(|c| cfg.preferred_breaks.contains(&c));
            if ends_on_break {
                cost *= cfg.punctuation_bonus;
            } else {
                cost += cfg.no_punct_penalty;
            }
        }

        cost + cfg.balance_penalty / length.max(1) as f64
    }

    /// Wrap tokenized text into at most `max_lines` lines
    pub fn plan(&self, tokenization: &Tokenization, measurer: &dyn TextMeasurer, font: &FontHandle) -> LineBreakPlan {
        let text = tokenization.text.as_str();
        if text.trim().is_empty() {
            return LineBreakPlan::empty();
        }

        let points = tokenization.break_points();
        let offsets = points.byte_offsets();

        if let Some(plan) = self.plan_optimal(text, offsets, measurer, font) {
            return plan;
        }

        let plan = self.plan_greedy(text, offsets, measurer, font);
        warn!(
            "No wrapping of {} chars fits {} line(s) of {:.0}px, {} line(s) forced",
            text.chars().count(),
            self.config.max_lines,
            self.config.max_width_px,
            plan.forced_lines()
        );
        plan
    }

    fn plan_optimal(
        &self,
        text: &str,
        offsets: &[usize],
        measurer: &dyn TextMeasurer,
        font: &FontHandle,
    ) -> Option<LineBreakPlan> {
        let m = offsets.len();
        let max_lines = self.config.max_lines;
        let last = m - 1;

        // Segment measurements shared by every line count
        let mut segments: Vec<Vec<Option<(f32, &str)>>> = vec![vec![None; m]; m];
        for i in 0..last {
            for j in (i + 1)..m {
                let segment = text[offsets[i]..offsets[j]].trim();
                if segment.is_empty() {
                    continue;
                }
                let width = measurer.measure(font, segment);
                // Longer segments starting at `i` only get wider
                if width > self.config.max_width_px {
                    break;
                }
                segments[i][j] = Some((width, segment));
            }
        }

        let mut dp = vec![vec![f64::INFINITY; max_lines + 1]; m];
        let mut next = vec![vec![usize::MAX; max_lines + 1]; m];
        dp[last][0] = 0.0;

        for k in 1..=max_lines {
            for i in (0..last).rev() {
                for j in (i + 1)..m {
                    let Some((width, segment)) = segments[i][j] else {
                        continue;
                    };
                    let rest = dp[j][k - 1];
                    if !rest.is_finite() {
                        continue;
                    }
                    let cost = self.line_cost(width, segment, j == last) + rest;
                    if cost < dp[i][k] {
                        dp[i][k] = cost;
                        next[i][k] = j;
                    }
                }
            }
        }

        let k = (1..=max_lines).find(|&k| dp[0][k].is_finite())?;

        let mut lines = Vec::with_capacity(k);
        let mut i = 0;
        for remaining in (1..=k).rev() {
            let j = next[i][remaining];
            let (width, segment) = segments[i][j]?;
            lines.push(LayoutLine::new(segment, width, self.config.max_width_px));
            i = j;
        }

        Some(LineBreakPlan {
            lines,
            strategy: LayoutStrategy::Optimal,
            cost: Some(dp[0][k]),
        })
    }

    fn plan_greedy(&self, text: &str, offsets: &[usize], measurer: &dyn TextMeasurer, font: &FontHandle) -> LineBreakPlan {
        let max_width = self.config.max_width_px;
        let max_lines = self.config.max_lines;
        let mut lines = Vec::new();
        let mut current_start = 0;

        let push_line = |lines: &mut Vec<LayoutLine>, start: usize, end: usize| {
            let segment = text[start..end].trim();
            if !segment.is_empty() {
                lines.push(LayoutLine::new(segment, measurer.measure(font, segment), max_width));
            }
        };

        for window in offsets.windows(2) {
            let (unit_start, unit_end) = (window[0], window[1]);
            if lines.len() + 1 >= max_lines {
                break;
            }

            let current = text[current_start..unit_start].trim();
            let candidate = text[current_start..unit_end].trim();
            if current.is_empty() || measurer.measure(font, candidate) <= max_width {
                continue;
            }

            push_line(&mut lines, current_start, unit_start);
            current_start = unit_start;
        }

        push_line(&mut lines, current_start, text.len());

        LineBreakPlan {
            lines,
            strategy: LayoutStrategy::Greedy,
            cost: None,
        }
    }
}
