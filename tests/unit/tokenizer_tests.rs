/*!
 * Tests for tokenization strategies and the strategy registry
 */

use std::sync::Arc;
use sublayout::errors::CollaboratorError;
use sublayout::layout::tokenizer::{normalize, tokenize_with_fallback, REGEX_STRATEGY};
use sublayout::layout::{RegexTokenizer, Tokenizer, TokenizerRegistry};
use crate::common::fake_collaborators::{FailingTokenizer, WordSpanTokenizer};

fn registry() -> TokenizerRegistry {
    TokenizerRegistry::new()
        .register("Morph", || Ok(Arc::new(WordSpanTokenizer) as Arc<dyn Tokenizer>))
        .register("missing", || Err(CollaboratorError::unavailable("missing", "not installed")))
        .register("broken", || Ok(Arc::new(FailingTokenizer) as Arc<dyn Tokenizer>))
}

/// Test whitespace normalization
#[test]
fn test_normalize_withMixedWhitespace_shouldCollapseAndTrim() {
    assert_eq!(normalize("  오늘\t날씨가\n\n정말   좋네요  "), "오늘 날씨가 정말 좋네요");
    assert_eq!(normalize(" \n\t "), "");
}

/// Test that the regex tokenizer marks whitespace and punctuation as break opportunities
#[test]
fn test_regexTokenizer_withSentence_shouldBreakAfterSpacesAndPunctuation() {
    let tokenizer = RegexTokenizer::default();
    let (tokenization, error) = tokenize_with_fallback("좋네요. 같이 가요", None, &tokenizer);

    assert!(error.is_none());
    assert_eq!(tokenization.strategy, REGEX_STRATEGY);
    assert_eq!(tokenization.pieces(), vec!["좋네요", ".", " ", "같이", " ", "가요"]);

    let breakable: Vec<bool> = tokenization.tokens.iter().map(|t| t.breakable).collect();
    assert_eq!(breakable, vec![false, true, true, false, true, false]);
}

/// Test that long unspaced runs get forced break opportunities
#[test]
fn test_regexTokenizer_withLongUnspacedRun_shouldChunkEveryInterval() {
    let tokenizer = RegexTokenizer::new(".,", 4);
    let (tokenization, _) = tokenize_with_fallback("가나다라마바사아자", None, &tokenizer);

    assert_eq!(tokenization.pieces(), vec!["가나다라", "마바사아", "자"]);
    assert_eq!(tokenization.break_points().char_offsets(), &[0, 4, 8, 9]);
}

/// Test that long punctuation runs also get forced break opportunities
#[test]
fn test_regexTokenizer_withLongPunctuationRun_shouldChunkEveryInterval() {
    let tokenizer = RegexTokenizer::default();
    let (tokenization, _) = tokenize_with_fallback(&"!".repeat(30), None, &tokenizer);

    assert_eq!(tokenization.break_points().char_offsets(), &[0, 8, 16, 24, 30]);
    assert!(tokenization.tokens.iter().all(|t| t.breakable));
    assert_eq!(tokenization.pieces().concat(), "!".repeat(30));
}

/// Test that break points carry matching character and byte offsets
#[test]
fn test_breakPoints_withMultibyteText_shouldMapCharsToBytes() {
    let tokenizer = RegexTokenizer::default();
    let (tokenization, _) = tokenize_with_fallback("안녕 세상", None, &tokenizer);
    let points = tokenization.break_points();

    assert_eq!(points.char_offsets(), &[0, 3, 5]);
    assert_eq!(points.byte_offsets(), &[0, 7, 13]);
    assert_eq!(points.len(), 3);
}

/// Test that a strategy leaving whitespace gaps gets them filled as break opportunities
#[test]
fn test_tokenizeWithFallback_withGappyStrategy_shouldFillGaps() {
    let strategy: Arc<dyn Tokenizer> = Arc::new(WordSpanTokenizer);
    let (tokenization, error) = tokenize_with_fallback("같이 산책 갈까요?", Some(&strategy), &RegexTokenizer::default());

    assert!(error.is_none());
    assert_eq!(tokenization.strategy, "morph");
    assert_eq!(tokenization.pieces().concat(), "같이 산책 갈까요?");
    assert_eq!(tokenization.break_points().char_offsets(), &[0, 3, 6, 10]);
}

/// Test that a failing strategy falls back to regex and reports why
#[test]
fn test_tokenizeWithFallback_withFailingStrategy_shouldUseRegexAndReportError() {
    let strategy: Arc<dyn Tokenizer> = Arc::new(FailingTokenizer);
    let (tokenization, error) = tokenize_with_fallback("hello world", Some(&strategy), &RegexTokenizer::default());

    assert_eq!(tokenization.strategy, REGEX_STRATEGY);
    assert_eq!(tokenization.pieces(), vec!["hello", " ", "world"]);
    let error = error.expect("fallback should report the strategy error");
    assert!(error.to_string().contains("dictionary not loaded"));
}

/// Test that empty input produces no tokens and no error
#[test]
fn test_tokenizeWithFallback_withBlankText_shouldProduceNoTokens() {
    let strategy: Arc<dyn Tokenizer> = Arc::new(FailingTokenizer);
    let (tokenization, error) = tokenize_with_fallback("   ", Some(&strategy), &RegexTokenizer::default());

    assert!(tokenization.text.is_empty());
    assert!(tokenization.tokens.is_empty());
    assert!(error.is_none());
}

/// Test the registry probes preferred names first, case-insensitively
#[test]
fn test_registry_probe_withPreferredNames_shouldSkipUnavailable() {
    let registry = registry();

    assert_eq!(registry.names(), vec!["morph", "missing", "broken"]);

    let chosen = registry.probe(&["MISSING".to_string(), "Broken".to_string()]);
    assert_eq!(chosen.map(|t| t.name().to_string()), Some("broken-morph".to_string()));

    let default_rank = registry.probe(&[]);
    assert_eq!(default_rank.map(|t| t.name().to_string()), Some("morph".to_string()));
}

/// Test that reaching "regex" in the ranking selects the fallback
#[test]
fn test_registry_probe_withRegexPreferred_shouldReturnNone() {
    let registry = registry();

    assert!(registry.probe(&["regex".to_string(), "morph".to_string()]).is_none());
    assert!(TokenizerRegistry::new().probe(&["morph".to_string()]).is_none());
}

/// Test that unknown strategies are reported unavailable
#[test]
fn test_registry_tryCreate_withUnknownName_shouldBeUnavailable() {
    let result = registry().try_create("hanja");
    assert!(matches!(result, Err(CollaboratorError::Unavailable { .. })));
}
