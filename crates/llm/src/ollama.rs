//! Client for a local Ollama daemon.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::error::ProviderError;
use crate::http::parse_response;
use crate::provider::{
    AnalysisOutput, AnalysisProvider, AnalysisRequest, ProviderKind, ProviderStatus,
    StatusReport, TokenUsage,
};

const KIND: ProviderKind = ProviderKind::Ollama;

/// Directories checked for the `ollama` binary in addition to `PATH`.
const EXTRA_BIN_DIRS: [&str; 3] = ["/usr/local/bin", "/opt/homebrew/bin", "/usr/bin"];

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    pub response: String,
    #[serde(default)]
    pub prompt_eval_count: Option<u32>,
    #[serde(default)]
    pub eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModelTag {
    pub name: String,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    model: &'a str,
    stream: bool,
}

/// Final status line of a non-streaming `/api/pull`.
#[derive(Debug, Deserialize, Serialize)]
pub struct PullResponse {
    pub status: String,
}

/// HTTP client for the Ollama REST API.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    status_timeout: Duration,
    generate_timeout: Duration,
    pull_timeout: Duration,
}

impl OllamaProvider {
    pub fn new(config: &AiConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &AiConfig) -> Self {
        Self {
            client,
            base_url: config.ollama_base_url.clone(),
            model: config.ollama_model.clone(),
            status_timeout: config.timeouts.status,
            generate_timeout: config.timeouts.generate,
            pull_timeout: config.timeouts.pull,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_model(&self) -> &str {
        &self.model
    }

    /// Download `model` into the daemon. Blocks until the pull finishes.
    pub async fn pull_model(&self, model: Option<&str>) -> Result<PullResponse, ProviderError> {
        let model = model.unwrap_or(&self.model);
        tracing::info!(provider = %KIND, model, "Pulling model");

        let response = self
            .client
            .post(format!("{}/api/pull", self.base_url))
            .timeout(self.pull_timeout)
            .json(&PullRequest {
                model,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| self.unavailable(self.pull_timeout, e))?;

        parse_response(KIND, self.pull_timeout, response).await
    }

    /// Map a transport error, distinguishing a missing or stopped daemon.
    fn unavailable(&self, timeout: Duration, err: reqwest::Error) -> ProviderError {
        if err.is_connect() {
            if find_ollama_binary().is_some() {
                ProviderError::NotRunning {
                    url: self.base_url.clone(),
                }
            } else {
                ProviderError::NotInstalled
            }
        } else {
            ProviderError::from_transport(KIND, timeout, err)
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
impl AnalysisProvider for OllamaProvider {
    fn kind(&self) -> ProviderKind {
        KIND
    }

    async fn status(&self, _api_key: Option<&str>) -> StatusReport {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(self.status_timeout)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                return match self.unavailable(self.status_timeout, e) {
                    ProviderError::NotInstalled => self.report(ProviderStatus::NotInstalled, None),
                    other => self.report(ProviderStatus::NotRunning, Some(other.to_string())),
                };
            }
        };

        match parse_response::<TagsResponse>(KIND, self.status_timeout, response).await {
            Ok(tags) if has_model(&tags, &self.model) => self.report(ProviderStatus::Ready, None),
            Ok(_) => self.report(
                ProviderStatus::ModelMissing,
                Some(format!("model '{}' has not been pulled", self.model)),
            ),
            Err(e) => self.report(ProviderStatus::NotRunning, Some(e.to_string())),
        }
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutput, ProviderError> {
        let model = request.model.as_deref().unwrap_or(&self.model);
        tracing::debug!(provider = %KIND, model, "Sending analysis request");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(self.generate_timeout)
            .json(&GenerateRequest {
                model,
                prompt: &request.prompt,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| self.unavailable(self.generate_timeout, e))?;

        let body: GenerateResponse = parse_response(KIND, self.generate_timeout, response).await?;
        Ok(into_output(model, body))
    }
}

pub(crate) fn into_output(model: &str, body: GenerateResponse) -> AnalysisOutput {
    let total = match (body.prompt_eval_count, body.eval_count) {
        (Some(p), Some(c)) => Some(p + c),
        _ => None,
    };
    AnalysisOutput {
        provider: KIND,
        model: model.to_string(),
        content: body.response.trim().to_string(),
        usage: TokenUsage {
            prompt_tokens: body.prompt_eval_count,
            completion_tokens: body.eval_count,
            total_tokens: total,
        },
    }
}

/// Model names match with or without the implicit `:latest` tag.
pub(crate) fn has_model(tags: &TagsResponse, model: &str) -> bool {
    let base = |name: &str| name.strip_suffix(":latest").unwrap_or(name).to_string();
    let wanted = base(model);
    tags.models.iter().any(|m| base(&m.name) == wanted)
}

/// Locate the `ollama` executable on `PATH` or in the usual install dirs.
pub fn find_ollama_binary() -> Option<PathBuf> {
    let exe = if cfg!(windows) { "ollama.exe" } else { "ollama" };
    let path_dirs = std::env::var_os("PATH")
        .map(|p| std::env::split_paths(&p).collect::<Vec<_>>())
        .unwrap_or_default();

    path_dirs
        .into_iter()
        .chain(EXTRA_BIN_DIRS.iter().map(PathBuf::from))
        .map(|dir| dir.join(exe))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn decodes_generate_response() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"model":"llama3.2","response":"  Solid fold.  ","done":true,
                "prompt_eval_count":120,"eval_count":80}"#,
        )
        .unwrap();
        let out = into_output("llama3.2", body);
        assert_eq!(out.content, "Solid fold.");
        assert_eq!(out.usage.total_tokens, Some(200));
    }

    #[test]
    fn missing_counts_leave_usage_empty() {
        let body: GenerateResponse = serde_json::from_str(r#"{"response":"ok"}"#).unwrap();
        assert_eq!(into_output("m", body).usage, TokenUsage::default());
    }

    #[test]
    fn model_lookup_ignores_latest_tag() {
        let tags: TagsResponse =
            serde_json::from_str(r#"{"models":[{"name":"llama3.2:latest"},{"name":"qwen2.5:7b"}]}"#)
                .unwrap();
        assert!(has_model(&tags, "llama3.2"));
        assert!(has_model(&tags, "qwen2.5:7b"));
        assert!(!has_model(&tags, "qwen2.5"));
    }

    #[tokio::test]
    async fn closed_port_is_reported_not_ready() {
        let config = AiConfig {
            ollama_base_url: "http://127.0.0.1:9".into(),
            ..AiConfig::default()
        };
        let provider = OllamaProvider::new(&config);
        let report = provider.status(None).await;
        assert_matches!(
            report.status,
            ProviderStatus::NotRunning | ProviderStatus::NotInstalled
        );

        let request = AnalysisRequest {
            prompt: "hi".into(),
            model: None,
            api_key: None,
        };
        assert_matches!(
            provider.analyze(&request).await,
            Err(ProviderError::NotRunning { .. } | ProviderError::NotInstalled)
        );
    }
}
