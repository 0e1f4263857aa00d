//! Core traits for content processing

use async_trait::async_trait;
use bytes::Bytes;
use depot_core::models::{ContentKind, JobKind};

use crate::derivatives::DerivativeError;

/// Stream-level facts reported by a media probe
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaProbeInfo {
    pub duration_secs: Option<f64>,
    pub bitrate: Option<u64>,
    pub codec: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Extracts audio/video stream details. Only consulted for audio and video.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, data: &[u8]) -> Result<MediaProbeInfo, anyhow::Error>;
}

/// A generated file to be stored alongside an object
#[derive(Debug, Clone, PartialEq)]
pub struct Derivative {
    pub name: String,
    pub content: Bytes,
}

impl Derivative {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Produces the derivatives for one derivative job.
///
/// `kind` is the content kind recorded by characterization. Implementations
/// reject job/kind combinations they cannot serve with
/// [`DerivativeError::Unsupported`].
#[async_trait]
pub trait DerivativeGenerator: Send + Sync {
    async fn generate(
        &self,
        job: JobKind,
        kind: ContentKind,
        content: &[u8],
    ) -> Result<Vec<Derivative>, DerivativeError>;
}
