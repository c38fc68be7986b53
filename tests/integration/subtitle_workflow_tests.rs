/*!
 * Integration tests for subtitle file processing workflow
 */

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use sublayout::app_config::Config;
use sublayout::app_controller::{Controller, LayoutDocument};
use sublayout::file_utils::FileManager;
use sublayout::layout::{LayoutOrchestrator, Zone};
use sublayout::providers::{FaceBox, SolidFrameSource, StaticFaceSampler};
use sublayout::subtitle_processor::{SubtitleCollection, SubtitleEntry};
use crate::common;
use crate::common::fake_collaborators::{context_with_faces, plain_context};

/// Test that subtitles can be written, parsed and laid out in one workflow
#[tokio::test]
async fn test_subtitle_workflow_withFullProcess_shouldLayOutEveryCue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let mut collection = SubtitleCollection::new(temp_dir.path().join("source.srt"));
    collection.entries.push(SubtitleEntry::new(1, 0, 5000, "First subtitle".to_string()));
    collection.entries.push(SubtitleEntry::new(2, 5500, 10000, "두 번째 자막입니다".to_string()));
    collection.entries.push(SubtitleEntry::new(3, 10500, 15000, "Third subtitle".to_string()));

    let subtitle_path = temp_dir.path().join("test.srt");
    collection.write_to_srt(&subtitle_path)?;

    let content = FileManager::read_to_string(&subtitle_path)?;
    let entries = SubtitleCollection::parse_srt_string(&content)?;
    assert_eq!(entries, collection.entries);

    let config = Config::default();
    let frames = Arc::new(SolidFrameSource::grey(
        config.layout.frame_width,
        config.layout.frame_height,
        15.0,
        config.layout.background_luma,
    ));
    // Face in the lower third of a portrait frame
    let context = context_with_faces(Arc::new(StaticFaceSampler::new(vec![FaceBox::new(300, 1400, 400, 400)])));
    let orchestrator = LayoutOrchestrator::new(context, config.style.clone(), frames)?;

    let segments: Vec<_> = entries.iter().map(SubtitleEntry::to_segment).collect();
    let layouts = orchestrator.layout_all(&segments, config.layout.concurrency).await?;

    assert_eq!(layouts.len(), 3);
    for (entry, layout) in entries.iter().zip(&layouts) {
        assert_eq!(layout.joined(), entry.text);
        assert_eq!(layout.zone, Zone::Top);
        assert_eq!(layout.face_count, 1);
        assert!(layout.warnings.is_empty());
    }

    Ok(())
}

/// Test processing a folder of subtitle files, including nested folders
#[tokio::test]
async fn test_run_folder_withNestedSubtitles_shouldWriteLayoutNextToEachFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path().to_path_buf();
    let season = root.join("season1");
    fs::create_dir_all(&season)?;

    common::create_test_subtitle(&root, "pilot.srt")?;
    common::create_test_subtitle(&season, "episode2.srt")?;
    common::create_test_file(&root, "notes.txt", "not a subtitle")?;

    let controller = Controller::with_context(Config::default(), plain_context())?;
    controller.run_folder(root.clone(), false).await?;

    for layout in [root.join("pilot.layout.json"), season.join("episode2.layout.json")] {
        let document: LayoutDocument = serde_json::from_str(&fs::read_to_string(&layout)?)?;
        assert_eq!(document.segments.len(), 3, "layout: {}", layout.display());
    }
    assert!(!root.join("notes.layout.json").exists());

    let issues_log = fs::read_to_string(root.join("sublayout.issues.log"))?;
    assert!(issues_log.contains("2 processed, 0 skipped, 0 errors"));

    Ok(())
}

/// Test that a broken file in a folder is counted as an error without stopping the run
#[tokio::test]
async fn test_run_folder_withInvalidFile_shouldContinueAndCountError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path().to_path_buf();

    common::create_test_subtitle(&root, "good.srt")?;
    common::create_test_file(&root, "bad.srt", "this is not an srt file\n")?;

    let controller = Controller::with_context(Config::default(), plain_context())?;
    controller.run_folder(root.clone(), false).await?;
    // A second pass skips the file that already has a layout
    controller.run_folder(root.clone(), false).await?;

    assert!(root.join("good.layout.json").exists());
    assert!(!root.join("bad.layout.json").exists());

    let issues_log = fs::read_to_string(root.join("sublayout.issues.log"))?;
    assert!(issues_log.contains("1 processed, 0 skipped, 1 errors"));
    assert!(issues_log.contains("0 processed, 1 skipped, 1 errors"));

    Ok(())
}

/// Test that folders without subtitles or that do not exist are rejected
#[tokio::test]
async fn test_run_folder_withoutSubtitles_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_context(Config::default(), plain_context())?;

    assert!(controller.run_folder(temp_dir.path().to_path_buf(), false).await.is_err());
    assert!(controller.run_folder(PathBuf::from("/no/such/folder"), false).await.is_err());

    Ok(())
}
