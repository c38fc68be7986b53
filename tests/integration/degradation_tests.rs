/*!
 * Integration tests for collaborator failures.
 *
 * A failing collaborator never fails a layout: the orchestrator substitutes
 * a default and records a warning on the result.
 */

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use sublayout::app_config::StyleConfig;
use sublayout::errors::{CollaboratorError, LayoutError};
use sublayout::layout::{CaptionSegment, LayoutContext, LayoutOrchestrator, LayoutWarning, Tokenizer, TokenizerRegistry, Zone};
use sublayout::providers::{FaceBox, FaceSampler, FontHandle, FrameSource, SolidFrameSource};
use crate::common;
use crate::common::fake_collaborators::{
    context_with_faces, plain_context, BrokenFrameSource, CountingFaceSampler, FailingFaceSampler, FailingTokenizer,
    FixedFontProvider, MissingFontProvider, SlowFaceSampler, WordSpanTokenizer,
};

const SENTENCE: &str = "오늘 날씨가 정말 좋네요. 같이 산책 갈까요?";

fn compact_style() -> StyleConfig {
    StyleConfig {
        font_size: 20,
        max_width_px: Some(240.0),
        max_lines: 2,
        ..Default::default()
    }
}

fn grey_frames(luma: u8) -> Arc<dyn FrameSource> {
    Arc::new(SolidFrameSource::grey(200, 300, 60.0, luma))
}

fn segment(text: &str) -> CaptionSegment {
    common::init_test_logging();
    CaptionSegment::new(1, text, 10.0, 12.0)
}

/// A face sampler that overruns its budget is treated as finding no faces
#[test]
fn test_layout_withSlowFaceSampler_shouldTimeOutAndIgnoreFaces() {
    let sampler = SlowFaceSampler {
        delay: Duration::from_millis(80),
        faces: vec![FaceBox::new(0, 200, 100, 100)],
    };
    let style = StyleConfig {
        face_timeout_ms: 10,
        ..compact_style()
    };
    let orchestrator = LayoutOrchestrator::new(context_with_faces(Arc::new(sampler)), style, grey_frames(128)).unwrap();

    let result = orchestrator.layout(&segment("hello"));

    assert_eq!(result.face_count, 0);
    assert_eq!(result.zone, Zone::Bottom);
    assert_eq!(result.texts(), vec!["hello"]);
    match result.warnings.as_slice() {
        [LayoutWarning::FaceSamplerUnavailable { reason }] => {
            assert!(reason.contains("slow-detector"));
            assert!(reason.contains("10ms"));
        }
        other => panic!("Expected a face sampler warning, got {:?}", other),
    }
}

/// A face sampler error is reported and placement proceeds without faces
#[test]
fn test_layout_withFailingFaceSampler_shouldWarnAndUseDefaultZone() {
    let orchestrator =
        LayoutOrchestrator::new(context_with_faces(Arc::new(FailingFaceSampler)), compact_style(), grey_frames(128))
            .unwrap();

    let result = orchestrator.layout(&segment(SENTENCE));

    assert_eq!(result.lines.len(), 2);
    assert_eq!(result.zone, Zone::Bottom);
    assert!(result.luminance.is_some());
    assert!(matches!(
        result.warnings.as_slice(),
        [LayoutWarning::FaceSamplerUnavailable { reason }] if reason.contains("model weights corrupted")
    ));
}

/// A face sampler that cannot be constructed disables face detection quietly
#[test]
fn test_layout_withUnavailableFaceSampler_shouldIgnoreFaces() {
    let context = LayoutContext::builder()
        .font_provider(Arc::new(FixedFontProvider))
        .face_sampler_factory(|| Err(CollaboratorError::unavailable("detector", "model file missing")))
        .build();
    let orchestrator = LayoutOrchestrator::new(Arc::new(context), compact_style(), grey_frames(128)).unwrap();

    let result = orchestrator.layout(&segment("hello"));

    assert_eq!(result.face_count, 0);
    assert!(result.warnings.is_empty());
}

/// Smart positioning off never calls the face sampler
#[test]
fn test_layout_withSmartPositioningOff_shouldNotDetectFaces() {
    let sampler = Arc::new(CountingFaceSampler::default());
    let style = StyleConfig {
        smart_positioning: false,
        ..compact_style()
    };
    let orchestrator =
        LayoutOrchestrator::new(context_with_faces(sampler.clone() as Arc<dyn FaceSampler>), style, grey_frames(250))
            .unwrap();

    let result = orchestrator.layout(&segment("hello"));

    assert_eq!(sampler.calls.load(Ordering::SeqCst), 0);
    // Luminance still drives the colours
    assert_eq!(result.text_color, "black");
}

/// A frame that cannot be decoded falls back to the default placement and base colours
#[test]
fn test_layout_withBrokenFrameSource_shouldUseDefaults() {
    let frames = Arc::new(BrokenFrameSource { width: 200, height: 300 });
    let orchestrator = LayoutOrchestrator::new(plain_context(), compact_style(), frames).unwrap();

    let result = orchestrator.layout(&segment(SENTENCE));

    assert_eq!(result.lines.len(), 2);
    assert_eq!(result.zone, Zone::Bottom);
    assert_eq!(result.margin_px, 80);
    assert_eq!(result.luminance, None);
    assert_eq!(result.text_color, "white");
    assert!((result.background_opacity - 0.7).abs() < 1e-6);
    assert!(matches!(
        result.warnings.as_slice(),
        [LayoutWarning::FrameUnavailable { reason }] if reason.contains("decoder error")
    ));
}

/// A missing font is replaced by the default font on every result
#[test]
fn test_layout_withMissingFont_shouldSubstituteDefaultFont() {
    let context = LayoutContext::builder()
        .font_provider(Arc::new(MissingFontProvider))
        .build();
    let orchestrator = LayoutOrchestrator::new(Arc::new(context), compact_style(), grey_frames(128)).unwrap();

    assert_eq!(orchestrator.font(), &FontHandle::default_with_size(20));

    for text in ["hello", SENTENCE] {
        let result = orchestrator.layout(&segment(text));
        assert_eq!(result.font.source, FontHandle::DEFAULT_SOURCE);
        assert!(matches!(
            result.warnings.as_slice(),
            [LayoutWarning::FontFallback { reason }] if reason.contains("not installed")
        ));
    }
}

/// A tokenizer that fails at run time falls back to the regex tokenizer
#[test]
fn test_layout_withFailingTokenizer_shouldFallBackToRegex() {
    let tokenizers = TokenizerRegistry::new()
        .register("broken", || Ok(Arc::new(FailingTokenizer) as Arc<dyn Tokenizer>));
    let context = LayoutContext::builder()
        .font_provider(Arc::new(FixedFontProvider))
        .tokenizers(tokenizers)
        .build();
    let orchestrator = LayoutOrchestrator::new(Arc::new(context), compact_style(), grey_frames(128)).unwrap();

    let result = orchestrator.layout(&segment(SENTENCE));

    assert_eq!(result.texts(), vec!["오늘 날씨가 정말 좋네요.", "같이 산책 갈까요?"]);
    assert!(matches!(
        result.warnings.as_slice(),
        [LayoutWarning::TokenizerFallback { strategy, .. }] if strategy == "broken-morph"
    ));
}

/// The preferred tokenizer is used when it can be constructed
#[test]
fn test_layout_withPreferredTokenizer_shouldUseItWithoutWarnings() {
    let tokenizers = TokenizerRegistry::new()
        .register("broken", || Ok(Arc::new(FailingTokenizer) as Arc<dyn Tokenizer>))
        .register("morph", || Ok(Arc::new(WordSpanTokenizer) as Arc<dyn Tokenizer>));
    let context = Arc::new(
        LayoutContext::builder()
            .font_provider(Arc::new(FixedFontProvider))
            .tokenizers(tokenizers)
            .build(),
    );
    let style = StyleConfig {
        preferred_tokenizer: vec!["morph".to_string()],
        max_width_px: Some(140.0),
        ..compact_style()
    };
    let orchestrator = LayoutOrchestrator::new(context.clone(), style, grey_frames(128)).unwrap();

    let result = orchestrator.layout(&segment("같이 산책 갈까요?"));

    assert_eq!(result.texts(), vec!["같이 산책", "갈까요?"]);
    assert!(result.warnings.is_empty());
    assert_eq!(context.tokenizer(&[]).map(|t| t.name().to_string()), Some("morph".to_string()));
}

/// Invalid configuration is the only error the orchestrator returns
#[test]
fn test_new_withInvalidConfiguration_shouldFail() {
    let zero_frames = Arc::new(SolidFrameSource::grey(0, 300, 60.0, 128));
    let result = LayoutOrchestrator::new(plain_context(), compact_style(), zero_frames);
    assert!(matches!(result, Err(LayoutError::Configuration(_))));

    let style = StyleConfig {
        max_width_px: Some(0.0),
        ..compact_style()
    };
    let result = LayoutOrchestrator::new(plain_context(), style, grey_frames(128));
    assert!(matches!(result, Err(LayoutError::Configuration(_))));
}
