/*!
 * Tokenization of caption text into breakable units.
 *
 * Strategies are probed by name from a ranked list; the first one that can be
 * constructed wins and is cached by the `LayoutContext`. When no strategy is
 * available the `RegexTokenizer` is used, which needs nothing but the text.
 *
 * Whatever the strategy, the tokens of a text always cover it exactly:
 * gaps left by a strategy are filled and overlapping output is rejected.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;

use crate::errors::CollaboratorError;

/// Name under which the built-in regex strategy can appear in a ranking
pub const REGEX_STRATEGY: &str = "regex";

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse whitespace runs to one space and trim the ends
pub fn normalize(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text, " ").trim().to_string()
}

/// A token as a byte range of the normalized text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    /// Whether a line may end right after this token
    pub breakable: bool,
}

impl Token {
    pub fn new(start: usize, end: usize, breakable: bool) -> Self {
        Self { start, end, breakable }
    }

    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// A tokenization strategy
pub trait Tokenizer: Send + Sync + Debug {
    /// Strategy name, as used in rankings
    fn name(&self) -> &str;

    /// Split normalized text into ordered, non-overlapping tokens.
    ///
    /// Strategies may leave gaps; they are filled by the caller.
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, CollaboratorError>;
}

/// Builds a strategy, or reports why it cannot be built
pub type TokenizerFactory = Box<dyn Fn() -> Result<Arc<dyn Tokenizer>, CollaboratorError> + Send + Sync>;

/// Named tokenizer strategies, in their default ranking order
#[derive(Default)]
pub struct TokenizerRegistry {
    strategies: Vec<(String, TokenizerFactory)>,
}

impl Debug for TokenizerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenizerRegistry")
            .field("strategies", &self.names())
            .finish()
    }
}

impl TokenizerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy. Later registrations rank lower.
    pub fn register<F>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Tokenizer>, CollaboratorError> + Send + Sync + 'static,
    {
        self.strategies.push((name.to_lowercase(), Box::new(factory)));
        self
    }

    /// Registered names in ranking order
    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Capability probe for one strategy
    pub fn try_create(&self, name: &str) -> Result<Arc<dyn Tokenizer>, CollaboratorError> {
        let name = name.to_lowercase();
        let (_, factory) = self
            .strategies
            .iter()
            .find(|(registered, _)| *registered == name)
            .ok_or_else(|| CollaboratorError::unavailable(name.clone(), "no such tokenizer strategy"))?;
        factory()
    }

    /// Probe `preferred` names, then the registered ranking, and return the first
    /// strategy that can be constructed.
    ///
    /// `None` means the regex fallback should be used, either because every probe
    /// failed or because "regex" was reached in the ranking.
    pub fn probe(&self, preferred: &[String]) -> Option<Arc<dyn Tokenizer>> {
        let mut tried = HashSet::new();
        let ranking = preferred
            .iter()
            .map(|name| name.to_lowercase())
            .chain(self.strategies.iter().map(|(name, _)| name.clone()));

        for name in ranking {
            if !tried.insert(name.clone()) {
                continue;
            }
            if name == REGEX_STRATEGY {
                debug!("Tokenizer ranking reached '{}', using regex tokenizer", REGEX_STRATEGY);
                return None;
            }
            match self.try_create(&name) {
                Ok(tokenizer) => {
                    debug!("Using '{}' tokenizer for subtitle wrapping", tokenizer.name());
                    return Some(tokenizer);
                }
                Err(e) => debug!("Tokenizer '{}' unavailable: {}", name, e),
            }
        }

        debug!("Falling back to regex-based subtitle tokenizer");
        None
    }
}

/// Tokenizer splitting on whitespace runs and punctuation runs.
///
/// Word runs longer than the force-break interval are cut into chunks so that
/// scripts written without spaces still get a break opportunity every
/// `force_break_interval` characters.
#[derive(Debug, Clone)]
pub struct RegexTokenizer {
    pattern: Regex,
    punctuation: Vec<char>,
    force_break_interval: usize,
}

impl RegexTokenizer {
    /// `punctuation` lists the characters that form punctuation runs
    pub fn new(punctuation: &str, force_break_interval: usize) -> Self {
        let class: String = punctuation.chars().map(|c| regex::escape(&c.to_string())).collect();
        let pattern = if class.is_empty() {
            Regex::new(r"\s+|\S+").unwrap()
        } else {
            Regex::new(&format!(r"\s+|[{class}]+|[^\s{class}]+")).unwrap()
        };

        Self {
            pattern,
            punctuation: punctuation.chars().collect(),
            force_break_interval: force_break_interval.max(1),
        }
    }

    /// Split `start..end` into `force_break_interval`-sized breakable chunks.
    ///
    /// The last chunk is breakable only when `breakable_end` is set.
    fn push_chunked_run(&self, tokens: &mut Vec<Token>, text: &str, start: usize, end: usize, breakable_end: bool) {
        let mut chunk_start = start;
        for (count, (offset, _)) in text[start..end].char_indices().enumerate() {
            if count > 0 && count % self.force_break_interval == 0 {
                tokens.push(Token::new(chunk_start, start + offset, true));
                chunk_start = start + offset;
            }
        }
        tokens.push(Token::new(chunk_start, end, breakable_end));
    }
}

impl Default for RegexTokenizer {
    fn default() -> Self {
        Self::new(".,!?…·;:-–—~", 8)
    }
}

impl Tokenizer for RegexTokenizer {
    fn name(&self) -> &str {
        REGEX_STRATEGY
    }

    fn tokenize(&self, text: &str) -> Result<Vec<Token>, CollaboratorError> {
        let mut tokens = Vec::new();
        for m in self.pattern.find_iter(text) {
            match m.as_str().chars().next() {
                Some(c) if c.is_whitespace() => tokens.push(Token::new(m.start(), m.end(), true)),
                Some(c) if self.punctuation.contains(&c) => {
                    self.push_chunked_run(&mut tokens, text, m.start(), m.end(), true)
                }
                _ => self.push_chunked_run(&mut tokens, text, m.start(), m.end(), false),
            }
        }
        Ok(tokens)
    }
}

/// Normalized text and the tokens covering it
#[derive(Debug, Clone, PartialEq)]
pub struct Tokenization {
    pub text: String,
    pub tokens: Vec<Token>,
    /// Name of the strategy that produced the tokens
    pub strategy: String,
}

impl Tokenization {
    /// Break opportunities: 0, the end of every breakable token, and the text length
    pub fn break_points(&self) -> BreakPoints {
        let mut byte_offsets = vec![0];
        byte_offsets.extend(self.tokens.iter().filter(|t| t.breakable).map(|t| t.end));
        byte_offsets.push(self.text.len());
        byte_offsets.sort_unstable();
        byte_offsets.dedup();
        BreakPoints::from_byte_offsets(&self.text, byte_offsets)
    }

    /// Token texts in order; their concatenation is the normalized text
    pub fn pieces(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.slice(&self.text)).collect()
    }
}

/// Sorted break offsets, kept both as character and byte positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakPoints {
    chars: Vec<usize>,
    bytes: Vec<usize>,
}

impl BreakPoints {
    fn from_byte_offsets(text: &str, bytes: Vec<usize>) -> Self {
        let mut chars = Vec::with_capacity(bytes.len());
        let mut next = bytes.iter().peekable();
        for (char_index, (byte_index, _)) in text.char_indices().enumerate() {
            while next.peek().is_some_and(|b| **b == byte_index) {
                chars.push(char_index);
                next.next();
            }
        }
        let char_len = text.chars().count();
        chars.extend(next.map(|_| char_len));
        Self { chars, bytes }
    }

    /// Number of break points
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Character offsets
    pub fn char_offsets(&self) -> &[usize] {
        &self.chars
    }

    /// Byte offsets, for slicing the text
    pub fn byte_offsets(&self) -> &[usize] {
        &self.bytes
    }
}

/// Tokenize `raw` with `strategy`, falling back to `fallback` when the strategy
/// is absent, fails, or returns tokens that do not fit the text.
///
/// The error is returned when a present strategy had to be abandoned.
pub fn tokenize_with_fallback(
    raw: &str,
    strategy: Option<&Arc<dyn Tokenizer>>,
    fallback: &RegexTokenizer,
) -> (Tokenization, Option<CollaboratorError>) {
    let text = normalize(raw);
    if text.is_empty() {
        return (
            Tokenization {
                text,
                tokens: Vec::new(),
                strategy: REGEX_STRATEGY.to_string(),
            },
            None,
        );
    }

    if let Some(strategy) = strategy {
        match strategy.tokenize(&text).and_then(|tokens| fill_gaps(&text, tokens)) {
            Ok(tokens) => {
                return (
                    Tokenization {
                        text,
                        tokens,
                        strategy: strategy.name().to_string(),
                    },
                    None,
                );
            }
            Err(e) => {
                warn!(
                    "Tokenizer '{}' failed, falling back to regex: {}",
                    strategy.name(),
                    e
                );
                let tokens = regex_tokens(&text, fallback);
                return (
                    Tokenization {
                        text,
                        tokens,
                        strategy: REGEX_STRATEGY.to_string(),
                    },
                    Some(e),
                );
            }
        }
    }

    let tokens = regex_tokens(&text, fallback);
    (
        Tokenization {
            text,
            tokens,
            strategy: REGEX_STRATEGY.to_string(),
        },
        None,
    )
}

fn regex_tokens(text: &str, fallback: &RegexTokenizer) -> Vec<Token> {
    // The regex alternatives cover every character, so no gaps remain
    fallback
        .tokenize(text)
        .and_then(|tokens| fill_gaps(text, tokens))
        .unwrap_or_else(|_| vec![Token::new(0, text.len(), false)])
}

/// Check strategy output and fill uncovered ranges.
///
/// Whitespace-only gaps are breakable, other gaps are not.
fn fill_gaps(text: &str, tokens: Vec<Token>) -> Result<Vec<Token>, CollaboratorError> {
    let mut filled = Vec::with_capacity(tokens.len() + 1);
    let mut cursor = 0;

    for token in tokens {
        if token.start < cursor || token.end < token.start || token.end > text.len() {
            return Err(CollaboratorError::Failed(format!(
                "token {}..{} is out of order or outside the text",
                token.start, token.end
            )));
        }
        if !text.is_char_boundary(token.start) || !text.is_char_boundary(token.end) {
            return Err(CollaboratorError::Failed(format!(
                "token {}..{} splits a character",
                token.start, token.end
            )));
        }
        if token.start > cursor {
            filled.push(gap_token(text, cursor, token.start));
        }
        if token.end > token.start {
            filled.push(token);
        }
        cursor = token.end;
    }

    if cursor < text.len() {
        filled.push(gap_token(text, cursor, text.len()));
    }

    Ok(filled)
}

fn gap_token(text: &str, start: usize, end: usize) -> Token {
    let breakable = text[start..end].chars().all(char::is_whitespace);
    Token::new(start, end, breakable)
}
