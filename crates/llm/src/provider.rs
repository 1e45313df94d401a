//! Provider-neutral request/response types and the [`AnalysisProvider`] trait.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::error::ProviderError;
use crate::gemini::GeminiProvider;
use crate::groq::GroqProvider;
use crate::ollama::OllamaProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Ollama,
    Gemini,
    Groq,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::Ollama, Self::Gemini, Self::Groq];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Gemini => "gemini",
            Self::Groq => "groq",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// Hosted providers need a per-user API key.
    pub fn requires_credential(self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Readiness of a provider as reported by [`AnalysisProvider::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderStatus {
    Ready,
    NotRunning,
    NotInstalled,
    ModelMissing,
    CredentialMissing,
    Unreachable,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub provider: ProviderKind,
    pub status: ProviderStatus,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub prompt: String,
    /// Overrides the provider's configured default model.
    pub model: Option<String>,
    /// Resolved credential; ignored by the local daemon.
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TokenUsage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutput {
    pub provider: ProviderKind,
    pub model: String,
    pub content: String,
    pub usage: TokenUsage,
}

/// A language-model backend able to analyze a hand.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Side-effect free readiness probe.
    async fn status(&self, api_key: Option<&str>) -> StatusReport;

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutput, ProviderError>;
}

/// One client per provider, sharing a connection pool.
#[derive(Clone)]
pub struct ProviderRegistry {
    pub ollama: Arc<OllamaProvider>,
    gemini: Arc<GeminiProvider>,
    groq: Arc<GroqProvider>,
}

impl ProviderRegistry {
    pub fn new(config: &AiConfig) -> Self {
        let client = reqwest::Client::new();
        Self {
            ollama: Arc::new(OllamaProvider::with_client(client.clone(), config)),
            gemini: Arc::new(GeminiProvider::with_client(client.clone(), config)),
            groq: Arc::new(GroqProvider::with_client(client, config)),
        }
    }

    pub fn get(&self, kind: ProviderKind) -> Arc<dyn AnalysisProvider> {
        match kind {
            ProviderKind::Ollama => self.ollama.clone(),
            ProviderKind::Gemini => self.gemini.clone(),
            ProviderKind::Groq => self.groq.clone(),
        }
    }
}
