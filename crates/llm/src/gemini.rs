//! Client for the Google Gemini `generateContent` API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::error::ProviderError;
use crate::http::{ensure_success, parse_response};
use crate::provider::{
    AnalysisOutput, AnalysisProvider, AnalysisRequest, ProviderKind, ProviderStatus,
    StatusReport, TokenUsage,
};

const KIND: ProviderKind = ProviderKind::Gemini;

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    status_timeout: Duration,
    generate_timeout: Duration,
}

impl GeminiProvider {
    pub fn new(config: &AiConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &AiConfig) -> Self {
        Self {
            client,
            base_url: config.gemini_base_url.clone(),
            model: config.gemini_model.clone(),
            status_timeout: config.timeouts.status,
            generate_timeout: config.timeouts.generate,
        }
    }

    fn report(&self, status: ProviderStatus, detail: Option<String>) -> StatusReport {
        StatusReport {
            provider: KIND,
            status,
            model: self.model.clone(),
            detail,
        }
    }
}

#[async_trait]
impl AnalysisProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        KIND
    }

    async fn status(&self, api_key: Option<&str>) -> StatusReport {
        let Some(key) = api_key else {
            return self.report(ProviderStatus::CredentialMissing, None);
        };

        let probe = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("x-goog-api-key", key)
            .timeout(self.status_timeout)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(KIND, self.status_timeout, e));

        match probe {
            Ok(response) => match ensure_success(KIND, response).await {
                Ok(_) => self.report(ProviderStatus::Ready, None),
                Err(e) => self.report(ProviderStatus::Unreachable, Some(e.to_string())),
            },
            Err(e) => self.report(ProviderStatus::Unreachable, Some(e.to_string())),
        }
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutput, ProviderError> {
        let key = request
            .api_key
            .as_deref()
            .ok_or(ProviderError::CredentialMissing { provider: KIND })?;
        let model = request.model.as_deref().unwrap_or(&self.model);
        tracing::debug!(provider = %KIND, model, "Sending analysis request");

        let body = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
        };

        let response = self
            .client
            .post(format!("{}/models/{model}:generateContent", self.base_url))
            .header("x-goog-api-key", key)
            .timeout(self.generate_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(KIND, self.generate_timeout, e))?;

        let body: GeminiResponse = parse_response(KIND, self.generate_timeout, response).await?;
        into_output(model, body)
    }
}

/// Join the text parts of the first candidate.
pub(crate) fn into_output(model: &str, body: GeminiResponse) -> Result<AnalysisOutput, ProviderError> {
    let text: String = body
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ProviderError::InvalidResponse {
            provider: KIND,
            message: "response contained no text".to_string(),
        });
    }

    let usage = body
        .usage_metadata
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        })
        .unwrap_or_default();

    Ok(AnalysisOutput {
        provider: KIND,
        model: model.to_string(),
        content: text.trim().to_string(),
        usage,
    })
}
