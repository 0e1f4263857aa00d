use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use super::content::ObjectId;
use super::fixity::Checksum;

/// Sequence position of a version within its object, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionRef(u32);

impl VersionRef {
    pub const FIRST: VersionRef = VersionRef(1);

    pub fn new(sequence: u32) -> Self {
        Self(sequence)
    }

    pub fn sequence(&self) -> u32 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for VersionRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "v{}", self.0)
    }
}

/// An immutable, stored version of a content object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub object_id: ObjectId,
    pub version_ref: VersionRef,
    pub label: String,
    /// Authoritative creation time. Backdated for imported versions.
    pub created_at: DateTime<Utc>,
    pub checksum: Checksum,
    pub size_bytes: u64,
}

/// Ordering used for version histories: creation time, then sequence.
pub fn chronological(a: &Version, b: &Version) -> std::cmp::Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then(a.version_ref.cmp(&b.version_ref))
}

/// One historical version to import from a remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    pub uri: String,
    pub created: DateTime<Utc>,
    pub label: String,
}

impl VersionDescriptor {
    pub fn new(uri: impl Into<String>, created: DateTime<Utc>, label: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            created,
            label: label.into(),
        }
    }
}
