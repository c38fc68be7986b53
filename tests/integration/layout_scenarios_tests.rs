/*!
 * End-to-end layout scenarios through the orchestrator
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use sublayout::app_config::StyleConfig;
use sublayout::layout::{CaptionSegment, LayoutOrchestrator, LayoutResult, LayoutStrategy, LayoutWarning, Zone};
use sublayout::providers::{FaceBox, SolidFrameSource, StaticFaceSampler};
use crate::common::fake_collaborators::{context_with_faces, plain_context};

fn compact_style() -> StyleConfig {
    StyleConfig {
        font_size: 20,
        max_width_px: Some(240.0),
        max_lines: 2,
        ..Default::default()
    }
}

fn orchestrator(style: StyleConfig, faces: Vec<FaceBox>) -> LayoutOrchestrator {
    let frames = Arc::new(SolidFrameSource::grey(200, 300, 120.0, 128));
    LayoutOrchestrator::new(context_with_faces(Arc::new(StaticFaceSampler::new(faces))), style, frames)
        .expect("style should be valid")
}

/// Korean sentence wraps after the full stop into two balanced lines
#[test]
fn test_layout_withKoreanSentence_shouldBreakAfterFullStop() {
    let result = orchestrator(compact_style(), vec![])
        .layout(&CaptionSegment::new(1, "오늘 날씨가 정말 좋네요. 같이 산책 갈까요?", 0.0, 2.0));

    assert_eq!(result.texts(), vec!["오늘 날씨가 정말 좋네요.", "같이 산책 갈까요?"]);
    assert_eq!(result.lines[0].width_px, 240.0);
    assert_eq!(result.lines[1].width_px, 170.0);
    assert_eq!(result.strategy, LayoutStrategy::Optimal);
    assert!(result.warnings.is_empty());
}

/// An unbreakable run wider than every line is force-fitted greedily
#[test]
fn test_layout_withUnbreakableRun_shouldFallBackToGreedyWithWarning() {
    let style = StyleConfig {
        max_width_px: Some(100.0),
        max_lines: 3,
        ..compact_style()
    };
    let text = "a".repeat(50);

    let result = orchestrator(style, vec![]).layout(&CaptionSegment::new(1, text.clone(), 0.0, 2.0));

    let lengths: Vec<usize> = result.lines.iter().map(|line| line.text.chars().count()).collect();
    assert_eq!(lengths, vec![8, 8, 34]);
    assert_eq!(result.strategy, LayoutStrategy::Greedy);
    assert_eq!(result.texts().concat(), text);
    assert!(result.lines[2].forced);
    assert_eq!(result.warnings, vec![LayoutWarning::InfeasibleLayout { forced_lines: 1 }]);
}

/// A face in the top band does not push a bottom-placed block anywhere
#[test]
fn test_layout_withFaceAtTopAndBottomRequested_shouldStayAtBottom() {
    let style = StyleConfig {
        position: Some(Zone::Bottom),
        ..compact_style()
    };

    let result = orchestrator(style, vec![FaceBox::new(0, 0, 100, 100)])
        .layout(&CaptionSegment::new(1, "hello", 0.0, 2.0));

    assert_eq!(result.zone, Zone::Bottom);
    assert_eq!(result.face_count, 1);
    assert_eq!(result.margin_px, 80);
    // One line: text 30 + 40 padding, background 24 more
    assert_eq!(result.text_height_px, 70);
    assert_eq!(result.background_height_px, 94);
    assert_eq!(result.y_px, 300 - 94 - 80);
}

/// A face filling the only allowed band grows the margin
#[test]
fn test_layout_withNoClearerZone_shouldGrowMargin() {
    let style = StyleConfig {
        position_priority: vec![Zone::Bottom],
        ..compact_style()
    };

    let result = orchestrator(style, vec![FaceBox::new(0, 200, 200, 100)])
        .layout(&CaptionSegment::new(1, "hello", 0.0, 2.0));

    assert_eq!(result.zone, Zone::Bottom);
    assert_eq!(result.margin_px, 140);
}

/// Huge margins saturate instead of overflowing when the margin grows
#[test]
fn test_layout_withHugeMarginAndFaceInOnlyZone_shouldSaturateMargin() {
    let style = StyleConfig {
        margin: u32::MAX - 10,
        position_priority: vec![Zone::Bottom],
        ..compact_style()
    };

    let result = orchestrator(style, vec![FaceBox::new(0, 250, 100, 40)])
        .layout(&CaptionSegment::new(1, "hello", 0.0, 2.0));

    assert_eq!(result.zone, Zone::Bottom);
    assert_eq!(result.margin_px, u32::MAX);
    assert_eq!(result.y_px, 0);
    assert_eq!(result.texts(), vec!["hello"]);
}

/// Huge paddings and line gaps saturate the block heights
#[test]
fn test_layout_withHugePaddings_shouldSaturateBlockHeights() {
    let style = StyleConfig {
        line_gap: u32::MAX,
        vertical_padding: u32::MAX,
        background_extra_padding: u32::MAX,
        ..compact_style()
    };

    let result = orchestrator(style, vec![]).layout(&CaptionSegment::new(1, "hello", 0.0, 2.0));

    assert_eq!(result.line_height_px, u32::MAX);
    assert_eq!(result.text_height_px, u32::MAX);
    assert_eq!(result.background_height_px, u32::MAX);
    assert_eq!(result.y_px, 0);
}

/// The same input always produces the same layout
#[test]
fn test_layout_withSameInput_shouldBeDeterministic() {
    let segment = CaptionSegment::new(3, "The quick brown fox jumps over the lazy dog.", 4.0, 6.5);
    let faces = vec![FaceBox::new(20, 220, 60, 60)];

    let first = orchestrator(compact_style(), faces.clone()).layout(&segment);
    let second = orchestrator(compact_style(), faces).layout(&segment);

    assert_eq!(first, second);
}

/// Empty captions produce an empty layout at the default position
#[test]
fn test_layout_withEmptyCaption_shouldReturnEmptyLayout() {
    let result = orchestrator(compact_style(), vec![FaceBox::new(0, 200, 100, 100)])
        .layout(&CaptionSegment::new(1, " \n\t ", 0.0, 2.0));

    assert!(result.is_empty());
    assert_eq!(result.strategy, LayoutStrategy::Empty);
    assert_eq!(result.zone, Zone::Bottom);
    assert_eq!(result.face_count, 0);
}

/// Layout results serialize into the JSON shape renderers read
#[test]
fn test_layoutResult_serialization_shouldRoundTrip() {
    let result = orchestrator(compact_style(), vec![])
        .layout(&CaptionSegment::new(1, "오늘 날씨가 정말 좋네요. 같이 산책 갈까요?", 0.0, 2.0));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["zone"], "bottom");
    assert_eq!(json["strategy"], "optimal");
    assert_eq!(json["lines"][0]["text"], "오늘 날씨가 정말 좋네요.");

    let restored: LayoutResult = serde_json::from_value(json).unwrap();
    assert_eq!(restored, result);
}

/// Batch layout keeps input order and reports progress for every segment
#[tokio::test]
async fn test_layoutAllWithProgress_shouldPreserveOrderAndReportProgress() {
    let orchestrator = LayoutOrchestrator::new(
        plain_context(),
        compact_style(),
        Arc::new(SolidFrameSource::grey(200, 300, 120.0, 40)),
    )
    .unwrap();
    let segments: Vec<CaptionSegment> = (0..25)
        .map(|i| {
            let text = if i % 5 == 0 { String::new() } else { format!("자막 번호 {}", i) };
            CaptionSegment::new(i + 1, text, i as f64, i as f64 + 1.5)
        })
        .collect();

    let completed = Arc::new(AtomicUsize::new(0));
    let reported = completed.clone();
    let results = orchestrator
        .layout_all_with_progress(&segments, 6, move |done, total| {
            assert_eq!(total, 25);
            reported.fetch_max(done, Ordering::SeqCst);
        })
        .await
        .unwrap();

    assert_eq!(completed.load(Ordering::SeqCst), 25);
    assert_eq!(results.len(), 25);
    for (segment, result) in segments.iter().zip(&results) {
        assert_eq!(result.start, segment.start);
        assert_eq!(result.joined(), segment.text);
        assert_eq!(result.is_empty(), segment.text.is_empty());
    }
    assert!(results.iter().filter(|r| !r.is_empty()).all(|r| r.text_color == "white"));
}
