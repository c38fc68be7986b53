/*!
 * The adaptive subtitle layout engine.
 *
 * Laying out a caption goes through these stages:
 * - `tokenizer`: normalize the text and find break opportunities
 * - `line_break`: wrap into a bounded number of balanced lines
 * - `zone`: place the block away from detected faces
 * - `style`: pick colours and opacity for the background luminance
 *
 * `orchestrator` runs the stages for a segment, and `context` holds the
 * shared collaborators they use.
 */

pub mod context;
pub mod line_break;
pub mod orchestrator;
pub mod result;
pub mod segment;
pub mod style;
pub mod tokenizer;
pub mod zone;

pub use context::{LayoutContext, LayoutContextBuilder};
pub use line_break::{LineBreakConfig, LineBreakPlan, LineBreakPlanner};
pub use orchestrator::LayoutOrchestrator;
pub use result::{LayoutLine, LayoutResult, LayoutStrategy, LayoutWarning};
pub use segment::CaptionSegment;
pub use style::{Brightness, StyleAdapter, StyleAdapterConfig, StyleDecision};
pub use tokenizer::{RegexTokenizer, Token, Tokenization, Tokenizer, TokenizerRegistry};
pub use zone::{Zone, ZoneDecision, ZoneScores, ZoneSelector, ZoneSelectorConfig};
