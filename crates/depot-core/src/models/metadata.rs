//! Technical metadata produced by characterization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::ContentKind;

/// Where the recorded MIME type came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MimeSource {
    Sniffed,
    Declared,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalMetadata {
    pub mime_type: String,
    pub mime_source: MimeSource,
    pub size_bytes: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: Option<f64>,
    pub page_count: Option<u32>,
    pub codec: Option<String>,
    pub bitrate: Option<u64>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u32>,
    pub characterized_at: DateTime<Utc>,
}

impl TechnicalMetadata {
    pub fn new(mime_type: impl Into<String>, mime_source: MimeSource, size_bytes: u64) -> Self {
        Self {
            mime_type: mime_type.into(),
            mime_source,
            size_bytes,
            width: None,
            height: None,
            duration_secs: None,
            page_count: None,
            codec: None,
            bitrate: None,
            sample_rate: None,
            channels: None,
            characterized_at: Utc::now(),
        }
    }

    pub fn content_kind(&self) -> ContentKind {
        ContentKind::from_mime_type(&self.mime_type)
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_serialization() {
        let mut metadata = TechnicalMetadata::new("video/mp4", MimeSource::Sniffed, 1024);
        metadata.width = Some(1920);
        metadata.height = Some(1080);
        metadata.duration_secs = Some(120.5);

        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.contains("\"mime_source\":\"sniffed\""));

        let deserialized: TechnicalMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.dimensions(), Some((1920, 1080)));
        assert_eq!(deserialized.duration_secs, Some(120.5));
        assert_eq!(deserialized.content_kind(), ContentKind::Video);
    }

    #[test]
    fn test_dimensions_require_both_axes() {
        let mut metadata = TechnicalMetadata::new("image/png", MimeSource::Declared, 10);
        metadata.width = Some(10);
        assert_eq!(metadata.dimensions(), None);
    }
}
