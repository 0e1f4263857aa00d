use depot_core::models::RemoteCredentials;
use depot_core::{ImportSettings, PipelineError, PipelineResult};

/// Pick the credentials for an import: the explicit pair when complete,
/// otherwise the configured legacy repository account.
pub fn resolve_credentials(
    explicit: Option<&RemoteCredentials>,
    settings: &ImportSettings,
) -> PipelineResult<RemoteCredentials> {
    explicit
        .filter(|c| c.is_complete())
        .or_else(|| settings.credentials.as_ref().filter(|c| c.is_complete()))
        .cloned()
        .ok_or_else(|| {
            PipelineError::Configuration(
                "Legacy repository credentials are not set \
                 (LEGACY_REPOSITORY_USER / LEGACY_REPOSITORY_PASSWORD)"
                    .to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(credentials: Option<RemoteCredentials>) -> ImportSettings {
        ImportSettings {
            credentials,
            ..Default::default()
        }
    }

    #[test]
    fn test_explicit_credentials_win() {
        let explicit = RemoteCredentials::new("alice", "a");
        let resolved = resolve_credentials(
            Some(&explicit),
            &settings(Some(RemoteCredentials::new("bob", "b"))),
        )
        .unwrap();
        assert_eq!(resolved.username(), "alice");
    }

    #[test]
    fn test_falls_back_to_configuration() {
        let resolved =
            resolve_credentials(None, &settings(Some(RemoteCredentials::new("bob", "b")))).unwrap();
        assert_eq!(resolved.username(), "bob");
    }

    #[test]
    fn test_blank_explicit_credentials_are_missing() {
        let blank = RemoteCredentials::new("alice", "  ");
        let resolved = resolve_credentials(
            Some(&blank),
            &settings(Some(RemoteCredentials::new("bob", "b"))),
        )
        .unwrap();
        assert_eq!(resolved.username(), "bob");
    }

    #[test]
    fn test_missing_credentials_is_configuration_error() {
        let err = resolve_credentials(None, &settings(None)).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }
}
