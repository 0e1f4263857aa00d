mod helpers;

use bytes::Bytes;
use depot_core::models::{ContentKind, JobKind, JobReport, JobStatus, MimeSource};
use depot_storage::ContentStore;
use helpers::{fixtures, object, setup_pipeline};

fn follow_up_kinds(reports: &[JobReport]) -> Vec<JobKind> {
    let mut kinds: Vec<JobKind> = reports
        .iter()
        .filter(|r| r.job.kind != JobKind::Characterize)
        .map(|r| r.job.kind)
        .collect();
    kinds.sort_by_key(|k| k.to_string());
    kinds
}

async fn deposit_and_run(content: Bytes, declared: Option<&str>) -> (Vec<JobReport>, helpers::TestPipeline) {
    let test = setup_pipeline();
    test.pipeline
        .deposit(&object("obj"), content, declared, None)
        .await
        .unwrap();
    let reports = test.pipeline.run_pending().await;
    assert!(reports.iter().all(|r| r.status == JobStatus::Completed));
    (reports, test)
}

#[tokio::test]
async fn test_image_gets_one_thumbnail() {
    let (reports, test) = deposit_and_run(fixtures::png(64, 32), None).await;
    assert_eq!(follow_up_kinds(&reports), vec![JobKind::GenerateThumbnail]);

    let stored = test.store.get_object(&object("obj")).await.unwrap();
    let metadata = stored.metadata.unwrap();
    assert_eq!(metadata.content_kind(), ContentKind::Image);
    assert_eq!(metadata.dimensions(), Some((64, 32)));
    assert_eq!(
        test.pipeline.derivatives(&object("obj")).await.unwrap(),
        vec!["thumbnail.png".to_string()]
    );
}

#[tokio::test]
async fn test_pdf_gets_one_thumbnail() {
    let (reports, test) = deposit_and_run(fixtures::pdf(4), None).await;
    assert_eq!(follow_up_kinds(&reports), vec![JobKind::GenerateThumbnail]);
    let metadata = test
        .store
        .get_object(&object("obj"))
        .await
        .unwrap()
        .metadata
        .unwrap();
    assert_eq!(metadata.page_count, Some(4));
}

#[tokio::test]
async fn test_video_gets_thumbnail_and_transcode() {
    let (reports, test) = deposit_and_run(fixtures::mp4(), None).await;
    assert_eq!(
        follow_up_kinds(&reports),
        vec![JobKind::GenerateThumbnail, JobKind::TranscodeVideo]
    );
    assert!(test
        .generator
        .requests()
        .iter()
        .all(|(_, kind)| *kind == ContentKind::Video));
}

#[tokio::test]
async fn test_audio_gets_transcode_only() {
    let (reports, _test) = deposit_and_run(fixtures::mp3(), None).await;
    assert_eq!(follow_up_kinds(&reports), vec![JobKind::TranscodeAudio]);
}

#[tokio::test]
async fn test_other_content_gets_nothing() {
    let (reports, test) = deposit_and_run(fixtures::text("plain notes"), Some("text/plain")).await;
    assert_eq!(reports.len(), 1);
    assert!(follow_up_kinds(&reports).is_empty());
    assert!(test.generator.requests().is_empty());

    let metadata = test
        .store
        .get_object(&object("obj"))
        .await
        .unwrap()
        .metadata
        .unwrap();
    assert_eq!(metadata.mime_type, "text/plain");
    assert_eq!(metadata.mime_source, MimeSource::Declared);
}

#[tokio::test]
async fn test_declared_type_classifies_unsniffable_content() {
    let (reports, _test) =
        deposit_and_run(fixtures::text("not really audio"), Some("audio/x-custom")).await;
    assert_eq!(follow_up_kinds(&reports), vec![JobKind::TranscodeAudio]);
}

#[tokio::test]
async fn test_repeated_characterization_is_not_deduplicated() {
    let test = setup_pipeline();
    let id = object("twice");
    test.pipeline
        .deposit(&id, fixtures::png(8, 8), None, None)
        .await
        .unwrap();
    test.pipeline.enqueue_characterization(&id).await.unwrap();

    let reports = test.pipeline.run_pending().await;
    let thumbnails = reports
        .iter()
        .filter(|r| r.job.kind == JobKind::GenerateThumbnail)
        .count();
    assert_eq!(thumbnails, 2);
}

#[tokio::test]
async fn test_characterize_reports_follow_up_ids() {
    let test = setup_pipeline();
    test.pipeline
        .deposit(&object("ids"), fixtures::mp4(), None, None)
        .await
        .unwrap();
    let reports = test.pipeline.run_pending().await;

    let characterize = reports
        .iter()
        .find(|r| r.job.kind == JobKind::Characterize)
        .unwrap();
    assert_eq!(characterize.follow_ups.len(), 2);
    for id in &characterize.follow_ups {
        let follow_up = reports.iter().find(|r| r.job.id == *id).unwrap();
        assert_eq!(follow_up.job.object_id, object("ids"));
    }
}
