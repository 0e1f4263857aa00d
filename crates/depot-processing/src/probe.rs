//! ffprobe-backed media probe

use crate::traits::{MediaProbe, MediaProbeInfo};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    format: Option<FFprobeFormat>,
    streams: Option<Vec<FFprobeStream>>,
}

#[derive(Debug, Deserialize)]
struct FFprobeFormat {
    duration: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FFprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

pub struct FfprobeProbe {
    ffprobe_path: String,
}

impl FfprobeProbe {
    pub fn new(ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    #[tracing::instrument(skip(self, file_path), fields(tool = "ffprobe"))]
    async fn probe_path(&self, file_path: &Path) -> Result<MediaProbeInfo> {
        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-show_format", "-show_streams", "-of", "json"])
            .arg(file_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to run ffprobe")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("ffprobe failed: {}", stderr.trim()));
        }

        parse_ffprobe_output(&output.stdout)
    }
}

/// Interpret `ffprobe -show_format -show_streams -of json` output.
///
/// Codec, sample rate and channels come from the first audio stream unless a
/// video stream exists, in which case codec and frame size come from it.
pub(crate) fn parse_ffprobe_output(stdout: &[u8]) -> Result<MediaProbeInfo> {
    let parsed: FFprobeOutput =
        serde_json::from_slice(stdout).context("Failed to parse ffprobe output")?;

    let duration_secs = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|d| d.parse::<f64>().ok());

    let bitrate = parsed
        .format
        .as_ref()
        .and_then(|f| f.bit_rate.as_ref())
        .and_then(|b| b.parse::<u64>().ok());

    let streams = parsed.streams.unwrap_or_default();
    let audio = streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"));
    let video = streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));

    Ok(MediaProbeInfo {
        duration_secs,
        bitrate,
        codec: video
            .or(audio)
            .and_then(|s| s.codec_name.clone()),
        sample_rate: audio
            .and_then(|s| s.sample_rate.as_ref())
            .and_then(|sr| sr.parse::<u32>().ok()),
        channels: audio.and_then(|s| s.channels),
        width: video.and_then(|s| s.width),
        height: video.and_then(|s| s.height),
    })
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn probe(&self, data: &[u8]) -> Result<MediaProbeInfo, anyhow::Error> {
        let temp_file = tempfile::NamedTempFile::new()?;
        tokio::fs::write(temp_file.path(), data).await?;
        self.probe_path(temp_file.path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_audio_output() {
        let json = br#"{
            "streams": [{"codec_type": "audio", "codec_name": "mp3", "sample_rate": "44100", "channels": 2}],
            "format": {"duration": "12.500000", "bit_rate": "128000"}
        }"#;
        let info = parse_ffprobe_output(json).unwrap();
        assert_eq!(info.duration_secs, Some(12.5));
        assert_eq!(info.bitrate, Some(128000));
        assert_eq!(info.codec.as_deref(), Some("mp3"));
        assert_eq!(info.sample_rate, Some(44100));
        assert_eq!(info.channels, Some(2));
        assert_eq!(info.width, None);
    }

    #[test]
    fn test_parse_video_output_prefers_video_codec() {
        let json = br#"{
            "streams": [
                {"codec_type": "audio", "codec_name": "aac", "sample_rate": "48000", "channels": 2},
                {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080}
            ],
            "format": {"duration": "3.0"}
        }"#;
        let info = parse_ffprobe_output(json).unwrap();
        assert_eq!(info.codec.as_deref(), Some("h264"));
        assert_eq!(info.width, Some(1920));
        assert_eq!(info.height, Some(1080));
        assert_eq!(info.sample_rate, Some(48000));
        assert_eq!(info.bitrate, None);
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_ffprobe_output(b"not json").is_err());
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let probe = FfprobeProbe::new("/nonexistent/ffprobe");
        assert!(probe.probe(b"ID3\x03").await.is_err());
    }
}
