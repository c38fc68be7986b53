/*!
 * # sublayout - adaptive subtitle layout engine
 *
 * A Rust library that decides how each subtitle cue is drawn over video.
 *
 * ## Features
 *
 * - Balanced multi-line wrapping with punctuation-aware line costs
 * - Greedy fallback that never loses text when nothing fits
 * - Face-aware placement in the top, middle or bottom zone
 * - Text colours and background opacity adapted to the background luminance
 * - Pluggable tokenizers, text measurers, face samplers and frame sources
 * - SRT input and JSON layout output for out-of-process renderers
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `layout`: The layout engine:
 *   - `layout::tokenizer`: Text normalization and break opportunities
 *   - `layout::line_break`: Optimal and greedy line wrapping
 *   - `layout::zone`: Face-aware zone selection
 *   - `layout::style`: Luminance-driven colours
 *   - `layout::orchestrator`: Per-segment and batch layout
 * - `providers`: Collaborator traits and reference implementations
 * - `subtitle_processor`: SRT parsing and writing
 * - `file_utils`: File system operations
 * - `app_controller`: Batch processing of subtitle files
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod file_utils;
pub mod subtitle_processor;
pub mod layout;
pub mod app_controller;
pub mod providers;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::{Config, StyleConfig};
pub use subtitle_processor::{SubtitleCollection, SubtitleEntry};
pub use layout::{CaptionSegment, LayoutContext, LayoutOrchestrator, LayoutResult, Zone};
pub use errors::{AppError, CollaboratorError, LayoutError};
