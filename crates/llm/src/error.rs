use crate::provider::ProviderKind;

/// Failure taxonomy for provider calls.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("No API key available for {provider}")]
    CredentialMissing { provider: ProviderKind },

    #[error("Ollama is not installed on this host")]
    NotInstalled,

    #[error("Ollama is not running at {url}")]
    NotRunning { url: String },

    /// Non-2xx reply, or no reply at all (`status: None`).
    #[error("{provider} request failed: {message}")]
    Upstream {
        provider: ProviderKind,
        status: Option<u16>,
        message: String,
    },

    #[error("{provider} did not answer within {seconds}s")]
    Timeout { provider: ProviderKind, seconds: u64 },

    /// The provider answered 2xx but the payload could not be decoded.
    #[error("{provider} returned an unexpected payload: {message}")]
    InvalidResponse {
        provider: ProviderKind,
        message: String,
    },

    #[error("Ollama installation failed: {0}")]
    InstallFailed(String),
}

impl ProviderError {
    /// Classify a transport-level [`reqwest::Error`].
    pub(crate) fn from_transport(
        provider: ProviderKind,
        timeout: std::time::Duration,
        err: reqwest::Error,
    ) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                provider,
                seconds: timeout.as_secs(),
            }
        } else if err.is_decode() {
            Self::InvalidResponse {
                provider,
                message: err.to_string(),
            }
        } else {
            Self::Upstream {
                provider,
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }
}
