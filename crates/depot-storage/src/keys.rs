//! Key validation shared by the filesystem backends

use crate::traits::{StoreError, StoreResult};

/// Reject path components that could escape the storage directory.
pub(crate) fn validate_component(kind: &str, value: &str) -> StoreResult<()> {
    if value.is_empty()
        || value == "."
        || value.contains("..")
        || value.contains('/')
        || value.contains('\\')
        || value.contains('\0')
    {
        return Err(StoreError::InvalidKey(format!(
            "{} contains invalid characters: {:?}",
            kind, value
        )));
    }
    Ok(())
}

/// Zero-padded file stem for a version so that directory listings sort in sequence order.
pub(crate) fn version_stem(sequence: u32) -> String {
    format!("{:010}", sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_traversal() {
        assert!(validate_component("object id", "../etc").is_err());
        assert!(validate_component("object id", "a/b").is_err());
        assert!(validate_component("object id", "").is_err());
        assert!(validate_component("object id", "44558d49x").is_ok());
    }

    #[test]
    fn test_version_stem_sorts() {
        assert!(version_stem(2) < version_stem(10));
    }
}
