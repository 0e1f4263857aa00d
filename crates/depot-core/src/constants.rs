//! Shared constants

/// MIME type recorded when neither sniffing nor the depositor could name the content.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Longest edge, in pixels, of generated thumbnails.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 150;

/// Seconds allowed for a single remote version fetch.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

/// Prefix used for labels of versions written by a deposit (`version1`, `version2`, ...).
pub const VERSION_LABEL_PREFIX: &str = "version";

/// Derivative names written through the content store.
pub mod derivatives {
    pub const THUMBNAIL: &str = "thumbnail.png";
    pub const AUDIO_MP3: &str = "audio.mp3";
    pub const AUDIO_OGG: &str = "audio.ogg";
    pub const VIDEO_MP4: &str = "video.mp4";
    pub const VIDEO_WEBM: &str = "video.webm";
}
