//! Clients for the language-model providers that generate hand analyses.
//!
//! Three backends sit behind the [`AnalysisProvider`] trait:
//! - [`OllamaProvider`]: a local daemon, no credential needed,
//! - [`GeminiProvider`] and [`GroqProvider`]: hosted APIs keyed per user.
//!
//! Everything is plain HTTP/JSON over [`reqwest`]. Requests carry fixed
//! timeouts from [`AiConfig`] and are never retried.

pub mod config;
pub mod credentials;
pub mod error;
pub mod gemini;
pub mod groq;
mod http;
pub mod installer;
pub mod ollama;
pub mod prompt;
pub mod provider;

pub use config::{AiConfig, AiTimeouts};
pub use error::ProviderError;
pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
pub use ollama::OllamaProvider;
pub use provider::{
    AnalysisOutput, AnalysisProvider, AnalysisRequest, ProviderKind, ProviderRegistry,
    ProviderStatus, StatusReport, TokenUsage,
};
