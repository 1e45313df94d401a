//! Which API key a hosted-provider call should use.

use crate::config::AiConfig;
use crate::error::ProviderError;
use crate::provider::ProviderKind;

/// Pick the credential for a call to `kind`.
///
/// Order: key supplied with the request, then the user's stored key, then
/// the server-wide development key (only when fallback is enabled). The
/// local daemon needs none and always resolves to `Ok(None)`.
pub fn resolve_credential(
    kind: ProviderKind,
    request_key: Option<&str>,
    stored_key: Option<&str>,
    config: &AiConfig,
) -> Result<Option<String>, ProviderError> {
    if !kind.requires_credential() {
        return Ok(None);
    }

    [request_key, stored_key, config.fallback_key(kind)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|k| !k.is_empty())
        .map(|k| Some(k.to_string()))
        .ok_or(ProviderError::CredentialMissing { provider: kind })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn config_with_fallback(enabled: bool) -> AiConfig {
        AiConfig {
            dev_fallback_enabled: enabled,
            gemini_fallback_key: Some("env-key".into()),
            ..AiConfig::default()
        }
    }

    #[test]
    fn request_key_wins() {
        let config = config_with_fallback(true);
        let key = resolve_credential(ProviderKind::Gemini, Some("req"), Some("stored"), &config);
        assert_eq!(key.unwrap().as_deref(), Some("req"));
    }

    #[test]
    fn stored_key_before_fallback() {
        let config = config_with_fallback(true);
        let key = resolve_credential(ProviderKind::Gemini, Some("  "), Some("stored"), &config);
        assert_eq!(key.unwrap().as_deref(), Some("stored"));
    }

    #[test]
    fn fallback_only_when_enabled() {
        let key = resolve_credential(ProviderKind::Gemini, None, None, &config_with_fallback(true));
        assert_eq!(key.unwrap().as_deref(), Some("env-key"));

        assert_matches!(
            resolve_credential(ProviderKind::Gemini, None, None, &config_with_fallback(false)),
            Err(ProviderError::CredentialMissing { provider: ProviderKind::Gemini })
        );
    }

    #[test]
    fn local_daemon_needs_no_key() {
        let key = resolve_credential(ProviderKind::Ollama, None, None, &AiConfig::default());
        assert_eq!(key.unwrap(), None);
    }
}
