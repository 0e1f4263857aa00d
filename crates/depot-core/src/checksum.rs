//! Content digests

use sha2::{Digest, Sha256, Sha512};

use crate::models::{Checksum, ChecksumAlgorithm};

/// Compute the digest of `bytes` with `algorithm`.
pub fn digest(algorithm: ChecksumAlgorithm, bytes: &[u8]) -> Checksum {
    let value = match algorithm {
        ChecksumAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
        ChecksumAlgorithm::Sha512 => hex::encode(Sha512::digest(bytes)),
    };
    Checksum::new(algorithm, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_value() {
        let checksum = digest(ChecksumAlgorithm::Sha256, b"hello world");
        assert_eq!(
            checksum.value,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_sha512_length() {
        let checksum = digest(ChecksumAlgorithm::Sha512, b"");
        assert_eq!(checksum.algorithm, ChecksumAlgorithm::Sha512);
        assert_eq!(checksum.value.len(), 128);
    }

    #[test]
    fn test_different_content_different_digest() {
        assert_ne!(
            digest(ChecksumAlgorithm::Sha256, b"hello world! version1"),
            digest(ChecksumAlgorithm::Sha256, b"hello world! version2")
        );
    }
}
