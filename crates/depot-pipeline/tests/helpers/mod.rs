#![allow(dead_code)]

pub mod fakes;
pub mod fixtures;

use std::sync::Arc;

use depot_core::models::{ChecksumAlgorithm, ObjectId, RemoteCredentials, VersionDescriptor};
use depot_core::PipelineConfig;
use depot_pipeline::{Pipeline, PipelineComponents};
use depot_processing::Characterizer;
use depot_storage::{MemoryContentStore, MemoryFixityLog};

use fakes::{FakeFetcher, StubGenerator};

/// Pipeline over in-memory stores with fake collaborators
pub struct TestPipeline {
    pub pipeline: Arc<Pipeline>,
    pub store: Arc<MemoryContentStore>,
    pub fetcher: Arc<FakeFetcher>,
    pub generator: Arc<StubGenerator>,
}

pub fn test_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.import.credentials = Some(RemoteCredentials::new("legacy", "s3cret"));
    config
}

pub fn setup_pipeline() -> TestPipeline {
    setup_pipeline_with(test_config())
}

pub fn setup_pipeline_with(config: PipelineConfig) -> TestPipeline {
    let store = Arc::new(MemoryContentStore::new(ChecksumAlgorithm::Sha256));
    let fetcher = Arc::new(FakeFetcher::default());
    let generator = Arc::new(StubGenerator::default());
    let pipeline = Pipeline::new(
        config,
        PipelineComponents {
            store: store.clone(),
            fixity_log: Arc::new(MemoryFixityLog::new()),
            fetcher: fetcher.clone(),
            generator: generator.clone(),
            characterizer: Characterizer::new(None),
        },
    );
    TestPipeline {
        pipeline,
        store,
        fetcher,
        generator,
    }
}

pub fn object(id: &str) -> ObjectId {
    ObjectId::from(id)
}

/// Two descriptors for the `44558d49x` legacy history
pub fn legacy_descriptors() -> Vec<VersionDescriptor> {
    vec![
        VersionDescriptor::new(
            "http://legacy.example/44558d49x/v1",
            "2016-09-28T20:00:14.658Z".parse().unwrap(),
            "version1",
        ),
        VersionDescriptor::new(
            "http://legacy.example/44558d49x/v2",
            "2016-09-29T15:58:00.639Z".parse().unwrap(),
            "version2",
        ),
    ]
}
