//! Response helpers shared by the provider clients.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::ProviderError;
use crate::provider::ProviderKind;

/// Longest upstream error body kept in [`ProviderError::Upstream`].
const MAX_ERROR_BODY: usize = 500;

/// Ensure the response has a success status code. On failure the status
/// and (truncated) body text become a [`ProviderError::Upstream`].
pub(crate) async fn ensure_success(
    provider: ProviderKind,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    let body: String = body.chars().take(MAX_ERROR_BODY).collect();
    Err(ProviderError::Upstream {
        provider,
        status: Some(status.as_u16()),
        message: format!("HTTP {}: {body}", status.as_u16()),
    })
}

/// Decode a successful JSON body.
pub(crate) async fn parse_response<T: DeserializeOwned>(
    provider: ProviderKind,
    timeout: Duration,
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let response = ensure_success(provider, response).await?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ProviderError::from_transport(provider, timeout, e))?;
    serde_json::from_slice(&bytes).map_err(|e| ProviderError::InvalidResponse {
        provider,
        message: e.to_string(),
    })
}
