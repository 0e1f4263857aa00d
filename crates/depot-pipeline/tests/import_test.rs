mod helpers;

use std::time::Duration;

use depot_core::models::{FixityOutcome, JobKind, RemoteCredentials, VersionDescriptor};
use depot_core::PipelineError;
use depot_storage::ContentStore;
use helpers::{fixtures, legacy_descriptors, object, setup_pipeline, setup_pipeline_with, test_config};

#[tokio::test]
async fn test_import_replays_history_in_order() {
    let test = setup_pipeline();
    let descriptors = legacy_descriptors();
    test.fetcher.serve(&descriptors[0].uri, fixtures::png(10, 10));
    test.fetcher.serve(&descriptors[1].uri, fixtures::png(20, 10));
    let id = object("44558d49x");

    let report = test
        .pipeline
        .import_versions(&id, &descriptors, None)
        .await
        .unwrap();

    assert_eq!(report.versions.len(), 2);
    let labels: Vec<&str> = report.versions.iter().map(|v| v.label.as_str()).collect();
    assert_eq!(labels, vec!["version1", "version2"]);
    assert_eq!(report.current, report.versions[1].version_ref);

    let stored = test.pipeline.versions(&id).await.unwrap();
    for (version, descriptor) in stored.iter().zip(&descriptors) {
        assert_eq!(version.label, descriptor.label);
        assert_eq!(version.created_at, descriptor.created);
    }

    let (object, current) = test.store.get(&id).await.unwrap();
    assert_eq!(current, fixtures::png(20, 10));
    assert_eq!(object.current_version, Some(report.current));
}

#[tokio::test]
async fn test_import_triggers_characterization_of_current_content() {
    let test = setup_pipeline();
    let descriptors = legacy_descriptors();
    test.fetcher.serve(&descriptors[0].uri, fixtures::pdf(1));
    test.fetcher.serve(&descriptors[1].uri, fixtures::png(30, 15));
    let id = object("44558d49x");

    let report = test
        .pipeline
        .import_versions(&id, &descriptors, None)
        .await
        .unwrap();
    let job_id = report.characterization_job.unwrap();

    let reports = test.pipeline.run_pending().await;
    let characterize = reports.iter().find(|r| r.job.id == job_id).unwrap();
    assert_eq!(characterize.job.kind, JobKind::Characterize);

    let metadata = test.store.get_object(&id).await.unwrap().metadata.unwrap();
    assert_eq!(metadata.dimensions(), Some((30, 15)));
}

#[tokio::test]
async fn test_timestamps_preserved_regardless_of_fetch_latency() {
    let test = setup_pipeline();
    let descriptors = legacy_descriptors();
    test.fetcher
        .serve_after(&descriptors[0].uri, fixtures::text("one"), Duration::from_millis(50));
    test.fetcher.serve(&descriptors[1].uri, fixtures::text("two"));
    let id = object("slow");

    test.pipeline
        .import_versions(&id, &descriptors, None)
        .await
        .unwrap();

    let stored = test.pipeline.versions(&id).await.unwrap();
    assert_eq!(stored[0].created_at, descriptors[0].created);
    assert_eq!(stored[1].created_at, descriptors[1].created);
    assert_eq!(stored[0].label, "version1");
}

#[tokio::test]
async fn test_unresolved_credentials_do_nothing() {
    let mut config = test_config();
    config.import.credentials = None;
    let test = setup_pipeline_with(config);
    let descriptors = legacy_descriptors();
    test.fetcher.serve(&descriptors[0].uri, fixtures::text("one"));

    let err = test
        .pipeline
        .import_versions(&object("a"), &descriptors, None)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Configuration(_)));
    assert_eq!(test.fetcher.calls(), 0);
    assert_eq!(test.store.write_count(), 0);
    assert!(test.pipeline.queue.is_empty());
}

#[tokio::test]
async fn test_explicit_credentials_used_for_every_fetch() {
    let mut config = test_config();
    config.import.credentials = None;
    let test = setup_pipeline_with(config);
    let descriptors = legacy_descriptors();
    test.fetcher.serve(&descriptors[0].uri, fixtures::text("one"));
    test.fetcher.serve(&descriptors[1].uri, fixtures::text("two"));

    let credentials = RemoteCredentials::new("archivist", "pw");
    test.pipeline
        .import_versions(&object("a"), &descriptors, Some(&credentials))
        .await
        .unwrap();

    assert_eq!(test.fetcher.seen_users(), vec!["archivist", "archivist"]);
}

#[tokio::test]
async fn test_second_fetch_failure_keeps_first_version() {
    let test = setup_pipeline();
    let descriptors = legacy_descriptors();
    test.fetcher.serve(&descriptors[0].uri, fixtures::text("one"));
    let id = object("partial");

    let err = test
        .pipeline
        .import_versions(&id, &descriptors, None)
        .await
        .unwrap_err();

    match &err {
        PipelineError::Fetch {
            object_id,
            index,
            label,
            uri,
            ..
        } => {
            assert_eq!(object_id, &id);
            assert_eq!(*index, 1);
            assert_eq!(label, "version2");
            assert_eq!(uri, &descriptors[1].uri);
        }
        other => panic!("expected fetch error, got {other}"),
    }
    assert!(err.to_string().contains("version2"));

    let stored = test.pipeline.versions(&id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].label, "version1");
    assert!(test.pipeline.queue.is_empty());
}

#[tokio::test]
async fn test_rerunning_the_remaining_suffix_completes_history() {
    let test = setup_pipeline();
    let descriptors = legacy_descriptors();
    test.fetcher.serve(&descriptors[0].uri, fixtures::text("one"));
    let id = object("resume");

    assert!(test
        .pipeline
        .import_versions(&id, &descriptors, None)
        .await
        .is_err());

    test.fetcher.serve(&descriptors[1].uri, fixtures::text("two"));
    test.pipeline
        .import_versions(&id, &descriptors[1..], None)
        .await
        .unwrap();

    let labels: Vec<String> = test
        .pipeline
        .versions(&id)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.label)
        .collect();
    assert_eq!(labels, vec!["version1", "version2"]);
    let (_, current) = test.store.get(&id).await.unwrap();
    assert_eq!(current, fixtures::text("two"));
}

#[tokio::test]
async fn test_import_records_fixity_for_each_version() {
    let test = setup_pipeline();
    let descriptors = legacy_descriptors();
    test.fetcher.serve(&descriptors[0].uri, fixtures::text("one"));
    test.fetcher.serve(&descriptors[1].uri, fixtures::text("two"));
    let id = object("fixity");

    test.pipeline
        .import_versions(&id, &descriptors, None)
        .await
        .unwrap();

    let log = test.pipeline.fixity_log(&id).await.unwrap();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|e| e.outcome == FixityOutcome::Pass));
}

#[tokio::test]
async fn test_backdated_history_ordered_by_timestamp() {
    let test = setup_pipeline();
    let descriptors = vec![
        VersionDescriptor::new(
            "http://legacy.example/b/new",
            "2020-01-01T00:00:00Z".parse().unwrap(),
            "later",
        ),
        VersionDescriptor::new(
            "http://legacy.example/b/old",
            "2010-01-01T00:00:00Z".parse().unwrap(),
            "earlier",
        ),
    ];
    test.fetcher.serve(&descriptors[0].uri, fixtures::text("later"));
    test.fetcher.serve(&descriptors[1].uri, fixtures::text("earlier"));
    let id = object("backdated");

    let report = test
        .pipeline
        .import_versions(&id, &descriptors, None)
        .await
        .unwrap();

    let labels: Vec<String> = test
        .pipeline
        .versions(&id)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.label)
        .collect();
    assert_eq!(labels, vec!["earlier", "later"]);

    // The last processed descriptor is current, whatever its timestamp.
    let (_, current) = test.store.get(&id).await.unwrap();
    assert_eq!(current, fixtures::text("earlier"));
    assert_eq!(report.current, report.versions[1].version_ref);
}
