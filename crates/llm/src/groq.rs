//! Client for the Groq chat-completions API (OpenAI-compatible).

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

const KIND: ProviderKind = ProviderKind::Groq;

const TEMPERATURE: f32 = 0.3;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

pub struct GroqProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    status_timeout: Duration,
    generate_timeout: Duration,
}

impl GroqProvider {
    pub fn new(config: &AiConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &AiConfig) -> Self {
        Self {
            client,
            base_url: config.groq_base_url.clone(),
            model: config.groq_model.clone(),
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
impl AnalysisProvider for GroqProvider {
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
            .bearer_auth(key)
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

        let body = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(key)
            .timeout(self.generate_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(KIND, self.generate_timeout, e))?;

        let body: ChatResponse = parse_response(KIND, self.generate_timeout, response).await?;
        into_output(model, body)
    }
}

pub(crate) fn into_output(model: &str, body: ChatResponse) -> Result<AnalysisOutput, ProviderError> {
    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ProviderError::InvalidResponse {
            provider: KIND,
            message: "response contained no choices".to_string(),
        })?;

    let usage = body
        .usage
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        })
        .unwrap_or_default();

    Ok(AnalysisOutput {
        provider: KIND,
        model: model.to_string(),
        content: content.trim().to_string(),
        usage,
    })
}
