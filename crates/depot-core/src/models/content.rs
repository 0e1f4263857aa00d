use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use super::fixity::Checksum;
use super::metadata::TechnicalMetadata;
use super::version::VersionRef;

/// Opaque, stable identifier of a content object.
///
/// Legacy repositories hand out identifiers such as `44558d49x`, so this is a
/// string rather than a UUID.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ObjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Closed classification of content, derived from characterization metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Image,
    Pdf,
    Audio,
    Video,
    Other,
}

impl ContentKind {
    pub const ALL: [ContentKind; 5] = [
        ContentKind::Image,
        ContentKind::Pdf,
        ContentKind::Audio,
        ContentKind::Video,
        ContentKind::Other,
    ];

    /// Classify a MIME type.
    ///
    /// This is the only place content is classified. Parameters (`; charset=...`)
    /// and case are ignored; anything unrecognised is `Other`.
    pub fn from_mime_type(mime_type: &str) -> Self {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/pdf" | "application/x-pdf" => ContentKind::Pdf,
            "application/ogg" => ContentKind::Audio,
            m if m.starts_with("image/") => ContentKind::Image,
            m if m.starts_with("audio/") => ContentKind::Audio,
            m if m.starts_with("video/") => ContentKind::Video,
            _ => ContentKind::Other,
        }
    }
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ContentKind::Image => write!(f, "image"),
            ContentKind::Pdf => write!(f, "pdf"),
            ContentKind::Audio => write!(f, "audio"),
            ContentKind::Video => write!(f, "video"),
            ContentKind::Other => write!(f, "other"),
        }
    }
}

impl FromStr for ContentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(ContentKind::Image),
            "pdf" => Ok(ContentKind::Pdf),
            "audio" => Ok(ContentKind::Audio),
            "video" => Ok(ContentKind::Video),
            "other" => Ok(ContentKind::Other),
            _ => Err(anyhow::anyhow!("Invalid content kind: {}", s)),
        }
    }
}

/// A content object as held by the content store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentObject {
    pub id: ObjectId,
    pub current_version: Option<VersionRef>,
    /// Checksum of the current content.
    pub checksum: Option<Checksum>,
    /// MIME type supplied by the depositor, used when sniffing finds nothing.
    pub declared_mime: Option<String>,
    pub metadata: Option<TechnicalMetadata>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentObject {
    pub fn new(id: ObjectId) -> Self {
        let now = Utc::now();
        Self {
            id,
            current_version: None,
            checksum: None,
            declared_mime: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Content kind from the last characterization, if any.
    pub fn content_kind(&self) -> Option<ContentKind> {
        self.metadata.as_ref().map(TechnicalMetadata::content_kind)
    }

    pub fn has_content(&self) -> bool {
        self.current_version.is_some()
    }
}
