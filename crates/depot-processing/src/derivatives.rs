//! Derivative generation: thumbnails and transcodes

use crate::traits::{Derivative, DerivativeGenerator};
use async_trait::async_trait;
use depot_core::constants::derivatives;
use depot_core::models::{ContentKind, JobKind};
use depot_core::ProcessingSettings;
use image::ImageFormat;
use std::ffi::OsString;
use std::io::Cursor;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

fn encode_thumbnail(content: &[u8], size: u32) -> Result<Vec<u8>, DerivativeError> {
    let img = image::load_from_memory(content)?;
    let thumbnail = img.thumbnail(size, size);
    let mut buffer = Vec::new();
    thumbnail.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}

#[derive(Debug, Error)]
pub enum DerivativeError {
    #[error("{job} is not supported for {kind} content")]
    Unsupported { job: JobKind, kind: ContentKind },

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Thumbnail task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl DerivativeError {
    /// Whether running the same job again could succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DerivativeError::ToolFailed { .. } | DerivativeError::Io(_))
    }
}

/// Generates derivatives with the `image` crate and external tools
/// (`ffmpeg`, `pdftoppm`).
pub struct MediaDerivativeGenerator {
    ffmpeg_path: String,
    pdftoppm_path: String,
    thumbnail_size: u32,
}

impl MediaDerivativeGenerator {
    pub fn new(
        ffmpeg_path: impl Into<String>,
        pdftoppm_path: impl Into<String>,
        thumbnail_size: u32,
    ) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            pdftoppm_path: pdftoppm_path.into(),
            thumbnail_size,
        }
    }

    pub fn from_settings(settings: &ProcessingSettings) -> Self {
        Self::new(
            settings.ffmpeg_path.clone(),
            settings.pdftoppm_path.clone(),
            settings.thumbnail_size,
        )
    }

    /// Scale an image to fit within the thumbnail box and encode it as PNG.
    ///
    /// Decoding and resizing run on the blocking thread pool.
    pub async fn image_thumbnail(&self, content: &[u8]) -> Result<Vec<u8>, DerivativeError> {
        let content = content.to_vec();
        let size = self.thumbnail_size;
        tokio::task::spawn_blocking(move || encode_thumbnail(&content, size)).await?
    }

    async fn pdf_thumbnail(&self, content: &[u8]) -> Result<Vec<u8>, DerivativeError> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("input.pdf");
        tokio::fs::write(&input, content).await?;
        let prefix = workdir.path().join("page");

        let size = self.thumbnail_size.to_string();
        let args: Vec<OsString> = vec![
            "-png".into(),
            "-f".into(),
            "1".into(),
            "-l".into(),
            "1".into(),
            "-scale-to".into(),
            size.into(),
            "-singlefile".into(),
            input.into_os_string(),
            prefix.clone().into_os_string(),
        ];
        run_tool(&self.pdftoppm_path, "pdftoppm", &args).await?;

        Ok(tokio::fs::read(prefix.with_extension("png")).await?)
    }

    async fn video_thumbnail(&self, content: &[u8]) -> Result<Vec<u8>, DerivativeError> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("input");
        let output = workdir.path().join(derivatives::THUMBNAIL);
        tokio::fs::write(&input, content).await?;

        let filter = format!(
            "thumbnail,scale={size}:{size}:force_original_aspect_ratio=decrease",
            size = self.thumbnail_size
        );
        let args: Vec<OsString> = vec![
            "-i".into(),
            input.into_os_string(),
            "-vf".into(),
            filter.into(),
            "-frames:v".into(),
            "1".into(),
            "-y".into(),
            output.clone().into_os_string(),
        ];
        run_tool(&self.ffmpeg_path, "ffmpeg", &args).await?;

        Ok(tokio::fs::read(&output).await?)
    }

    /// Transcode `content` once per `(name, codec args)` target
    async fn transcode(
        &self,
        content: &[u8],
        targets: &[(&str, &[&str])],
    ) -> Result<Vec<Derivative>, DerivativeError> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("input");
        tokio::fs::write(&input, content).await?;

        let mut outputs = Vec::with_capacity(targets.len());
        for (name, codec_args) in targets {
            let output = workdir.path().join(name);
            let mut args: Vec<OsString> = vec!["-i".into(), input.clone().into_os_string()];
            args.extend(codec_args.iter().map(OsString::from));
            args.push("-y".into());
            args.push(output.clone().into_os_string());

            run_tool(&self.ffmpeg_path, "ffmpeg", &args).await?;
            let data = tokio::fs::read(&output).await?;
            outputs.push(Derivative::new(*name, data));
        }
        Ok(outputs)
    }
}

async fn run_tool(program: &str, tool: &str, args: &[OsString]) -> Result<(), DerivativeError> {
    let output = Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| DerivativeError::ToolFailed {
            tool: tool.to_string(),
            message: format!("failed to execute {}: {}", program, e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DerivativeError::ToolFailed {
            tool: tool.to_string(),
            message: stderr.trim().to_string(),
        });
    }
    Ok(())
}

const AUDIO_TARGETS: &[(&str, &[&str])] = &[
    (derivatives::AUDIO_MP3, &["-vn", "-acodec", "libmp3lame", "-q:a", "4", "-f", "mp3"]),
    (derivatives::AUDIO_OGG, &["-vn", "-acodec", "libvorbis", "-q:a", "4", "-f", "ogg"]),
];

const VIDEO_TARGETS: &[(&str, &[&str])] = &[
    (
        derivatives::VIDEO_MP4,
        &[
            "-c:v", "libx264", "-preset", "medium", "-crf", "23", "-c:a", "aac", "-movflags",
            "+faststart", "-f", "mp4",
        ],
    ),
    (
        derivatives::VIDEO_WEBM,
        &["-c:v", "libvpx-vp9", "-b:v", "0", "-crf", "33", "-c:a", "libopus", "-f", "webm"],
    ),
];

#[async_trait]
impl DerivativeGenerator for MediaDerivativeGenerator {
    #[tracing::instrument(skip(self, content), fields(size_bytes = content.len()))]
    async fn generate(
        &self,
        job: JobKind,
        kind: ContentKind,
        content: &[u8],
    ) -> Result<Vec<Derivative>, DerivativeError> {
        let start = std::time::Instant::now();
        let outputs = match (job, kind) {
            (JobKind::GenerateThumbnail, ContentKind::Image) => {
                vec![Derivative::new(derivatives::THUMBNAIL, self.image_thumbnail(content).await?)]
            }
            (JobKind::GenerateThumbnail, ContentKind::Pdf) => {
                vec![Derivative::new(derivatives::THUMBNAIL, self.pdf_thumbnail(content).await?)]
            }
            (JobKind::GenerateThumbnail, ContentKind::Video) => vec![Derivative::new(
                derivatives::THUMBNAIL,
                self.video_thumbnail(content).await?,
            )],
            (JobKind::TranscodeAudio, ContentKind::Audio) => {
                self.transcode(content, AUDIO_TARGETS).await?
            }
            (JobKind::TranscodeVideo, ContentKind::Video) => {
                self.transcode(content, VIDEO_TARGETS).await?
            }
            (job, kind) => return Err(DerivativeError::Unsupported { job, kind }),
        };

        tracing::info!(
            count = outputs.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Generated derivatives"
        );
        Ok(outputs)
    }
}
