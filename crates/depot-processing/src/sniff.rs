//! MIME detection from content bytes
//!
//! Only magic bytes are inspected. File names and labels are never consulted.

const OGG_VIDEO_MARKER: &[u8] = b"\x80theora";
const MATROSKA_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// Detect the MIME type of `data`, or `None` when no signature matches.
pub fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
        return Some("image/tiff");
    }
    if data.starts_with(b"%PDF-") {
        return Some("application/pdf");
    }
    if data.starts_with(b"fLaC") {
        return Some("audio/flac");
    }
    if data.starts_with(b"OggS") {
        return Some(if contains(head(data, 512), OGG_VIDEO_MARKER) {
            "video/ogg"
        } else {
            "audio/ogg"
        });
    }
    if data.starts_with(&MATROSKA_MAGIC) {
        return Some(if contains(head(data, 64), b"webm") {
            "video/webm"
        } else {
            "video/x-matroska"
        });
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") {
        return match &data[8..12] {
            b"WEBP" => Some("image/webp"),
            b"WAVE" => Some("audio/wav"),
            b"AVI " => Some("video/x-msvideo"),
            _ => None,
        };
    }
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        return Some(match &data[8..12] {
            b"M4A " | b"M4B " => "audio/mp4",
            b"qt  " => "video/quicktime",
            _ => "video/mp4",
        });
    }
    if data.starts_with(b"ID3") || is_mpeg_audio_frame(data) {
        return Some("audio/mpeg");
    }
    if data.len() >= 14 && data.starts_with(b"BM") {
        return Some("image/bmp");
    }
    None
}

/// MPEG audio frame sync: 11 set bits followed by a valid layer.
fn is_mpeg_audio_frame(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && (data[1] & 0xE0) == 0xE0 && (data[1] & 0x06) != 0
}

fn head(data: &[u8], len: usize) -> &[u8] {
    &data[..data.len().min(len)]
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
