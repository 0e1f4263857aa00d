use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use super::content::ObjectId;
use super::version::VersionRef;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

impl Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ChecksumAlgorithm::Sha256 => write!(f, "sha256"),
            ChecksumAlgorithm::Sha512 => write!(f, "sha512"),
        }
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(ChecksumAlgorithm::Sha256),
            "sha512" => Ok(ChecksumAlgorithm::Sha512),
            _ => Err(anyhow::anyhow!("Invalid checksum algorithm: {}", s)),
        }
    }
}

/// A content digest: algorithm plus lowercase hex value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum {
    pub algorithm: ChecksumAlgorithm,
    pub value: String,
}

impl Checksum {
    pub fn new(algorithm: ChecksumAlgorithm, value: impl Into<String>) -> Self {
        Self {
            algorithm,
            value: value.into().to_ascii_lowercase(),
        }
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.algorithm, self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixityOutcome {
    Pass,
    Fail,
}

impl FixityOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, FixityOutcome::Pass)
    }
}

impl Display for FixityOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FixityOutcome::Pass => write!(f, "pass"),
            FixityOutcome::Fail => write!(f, "fail"),
        }
    }
}

/// One entry of an object's append-only fixity audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixityEntry {
    pub object_id: ObjectId,
    pub version_ref: Option<VersionRef>,
    pub checked_at: DateTime<Utc>,
    pub expected: Checksum,
    pub actual: Checksum,
    pub outcome: FixityOutcome,
}

impl FixityEntry {
    /// Compare two digests. Digests from different algorithms never match.
    pub fn compare(
        object_id: ObjectId,
        version_ref: Option<VersionRef>,
        expected: Checksum,
        actual: Checksum,
    ) -> Self {
        let outcome = if expected == actual {
            FixityOutcome::Pass
        } else {
            FixityOutcome::Fail
        };
        Self {
            object_id,
            version_ref,
            checked_at: Utc::now(),
            expected,
            actual,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_normalizes_hex_case() {
        let checksum = Checksum::new(ChecksumAlgorithm::Sha256, "ABCDEF");
        assert_eq!(checksum.value, "abcdef");
        assert_eq!(checksum.to_string(), "sha256:abcdef");
    }

    #[test]
    fn test_algorithm_from_str_accepts_dashed_names() {
        assert_eq!(
            "SHA-512".parse::<ChecksumAlgorithm>().unwrap(),
            ChecksumAlgorithm::Sha512
        );
        assert!("md5".parse::<ChecksumAlgorithm>().is_err());
    }

    #[test]
    fn test_compare_matching_digests_pass() {
        let c = Checksum::new(ChecksumAlgorithm::Sha256, "aa");
        let entry = FixityEntry::compare(ObjectId::from("o"), None, c.clone(), c);
        assert!(entry.outcome.passed());
    }

    #[test]
    fn test_compare_across_algorithms_fails() {
        let entry = FixityEntry::compare(
            ObjectId::from("o"),
            Some(VersionRef::FIRST),
            Checksum::new(ChecksumAlgorithm::Sha256, "aa"),
            Checksum::new(ChecksumAlgorithm::Sha512, "aa"),
        );
        assert_eq!(entry.outcome, FixityOutcome::Fail);
    }
}
