//! Characterization: technical metadata extraction and classification

use crate::document::pdf_page_count;
use crate::probe::FfprobeProbe;
use crate::sniff::sniff_mime;
use crate::traits::MediaProbe;
use depot_core::constants::FALLBACK_MIME_TYPE;
use depot_core::models::{ContentKind, MimeSource, TechnicalMetadata};
use depot_core::ProcessingSettings;
use image::ImageReader;
use std::io::Cursor;
use std::sync::Arc;

/// Extracts technical metadata from content bytes.
///
/// The MIME type is sniffed from the bytes, falling back to the declared type
/// and then to `application/octet-stream`. Secondary extraction failures
/// (undecodable image, probe error) are logged and leave fields empty; they
/// never fail characterization.
pub struct Characterizer {
    probe: Option<Arc<dyn MediaProbe>>,
}

impl Characterizer {
    pub fn new(probe: Option<Arc<dyn MediaProbe>>) -> Self {
        Self { probe }
    }

    pub fn from_settings(settings: &ProcessingSettings) -> Self {
        let probe: Option<Arc<dyn MediaProbe>> = if settings.probe_media {
            Some(Arc::new(FfprobeProbe::new(settings.ffprobe_path.clone())))
        } else {
            None
        };
        Self::new(probe)
    }

    /// Resolve the MIME type and where it came from.
    pub fn detect_mime(content: &[u8], declared_mime: Option<&str>) -> (String, MimeSource) {
        if let Some(sniffed) = sniff_mime(content) {
            return (sniffed.to_string(), MimeSource::Sniffed);
        }
        match declared_mime.map(str::trim).filter(|m| !m.is_empty()) {
            Some(declared) => (declared.to_ascii_lowercase(), MimeSource::Declared),
            None => (FALLBACK_MIME_TYPE.to_string(), MimeSource::Fallback),
        }
    }

    #[tracing::instrument(skip(self, content, declared_mime), fields(size_bytes = content.len()))]
    pub async fn characterize(
        &self,
        content: &[u8],
        declared_mime: Option<&str>,
    ) -> TechnicalMetadata {
        let (mime_type, mime_source) = Self::detect_mime(content, declared_mime);
        let mut metadata = TechnicalMetadata::new(mime_type, mime_source, content.len() as u64);

        match metadata.content_kind() {
            ContentKind::Image => match image_dimensions(content) {
                Ok((width, height)) => {
                    metadata.width = Some(width);
                    metadata.height = Some(height);
                }
                Err(e) => {
                    tracing::warn!(error = %e, mime_type = %metadata.mime_type, "Could not read image dimensions");
                }
            },
            ContentKind::Pdf => {
                metadata.page_count = pdf_page_count(content);
            }
            ContentKind::Audio | ContentKind::Video => {
                if let Some(probe) = &self.probe {
                    match probe.probe(content).await {
                        Ok(info) => {
                            metadata.duration_secs = info.duration_secs;
                            metadata.bitrate = info.bitrate;
                            metadata.codec = info.codec;
                            metadata.sample_rate = info.sample_rate;
                            metadata.channels = info.channels;
                            metadata.width = info.width;
                            metadata.height = info.height;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Media probe failed, keeping basic metadata");
                        }
                    }
                }
            }
            ContentKind::Other => {}
        }

        tracing::debug!(
            mime_type = %metadata.mime_type,
            mime_source = ?metadata.mime_source,
            kind = %metadata.content_kind(),
            "Characterized content"
        );
        metadata
    }
}

fn image_dimensions(content: &[u8]) -> Result<(u32, u32), image::ImageError> {
    ImageReader::new(Cursor::new(content))
        .with_guessed_format()?
        .into_dimensions()
}
