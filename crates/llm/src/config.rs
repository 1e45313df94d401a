use std::time::Duration;

use crate::provider::ProviderKind;

/// Per-operation timeouts for provider calls.
#[derive(Debug, Clone, Copy)]
pub struct AiTimeouts {
    pub status: Duration,
    pub generate: Duration,
    pub pull: Duration,
    pub install: Duration,
}

impl Default for AiTimeouts {
    fn default() -> Self {
        Self {
            status: Duration::from_secs(5),
            generate: Duration::from_secs(120),
            pull: Duration::from_secs(1800),
            install: Duration::from_secs(900),
        }
    }
}

/// Provider endpoints, models and credential fallbacks.
#[derive(Clone)]
pub struct AiConfig {
    pub default_provider: ProviderKind,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub groq_base_url: String,
    pub groq_model: String,
    /// Allow the server-wide keys below when a user has none.
    pub dev_fallback_enabled: bool,
    pub gemini_fallback_key: Option<String>,
    pub groq_fallback_key: Option<String>,
    pub timeouts: AiTimeouts,
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("default_provider", &self.default_provider)
            .field("ollama_base_url", &self.ollama_base_url)
            .field("ollama_model", &self.ollama_model)
            .field("gemini_model", &self.gemini_model)
            .field("groq_model", &self.groq_model)
            .field("dev_fallback_enabled", &self.dev_fallback_enabled)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            default_provider: ProviderKind::Ollama,
            ollama_base_url: "http://localhost:11434".into(),
            ollama_model: "llama3.2".into(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            gemini_model: "gemini-2.0-flash".into(),
            groq_base_url: "https://api.groq.com/openai/v1".into(),
            groq_model: "llama-3.3-70b-versatile".into(),
            dev_fallback_enabled: false,
            gemini_fallback_key: None,
            groq_fallback_key: None,
            timeouts: AiTimeouts::default(),
        }
    }
}

impl AiConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                                             |
    /// |-------------------------------|-----------------------------------------------------|
    /// | `AI_DEFAULT_PROVIDER`         | `ollama`                                            |
    /// | `OLLAMA_BASE_URL`             | `http://localhost:11434`                            |
    /// | `OLLAMA_MODEL`                | `llama3.2`                                          |
    /// | `GEMINI_BASE_URL`             | `https://generativelanguage.googleapis.com/v1beta`  |
    /// | `GEMINI_MODEL`                | `gemini-2.0-flash`                                  |
    /// | `GROQ_BASE_URL`               | `https://api.groq.com/openai/v1`                    |
    /// | `GROQ_MODEL`                  | `llama-3.3-70b-versatile`                           |
    /// | `AI_DEV_FALLBACK_ENABLED`     | `false`                                             |
    /// | `GEMINI_API_KEY`              | unset                                               |
    /// | `GROQ_API_KEY`                | unset                                               |
    /// | `AI_STATUS_TIMEOUT_SECS`      | `5`                                                 |
    /// | `AI_GENERATE_TIMEOUT_SECS`    | `120`                                               |
    /// | `OLLAMA_PULL_TIMEOUT_SECS`    | `1800`                                              |
    /// | `OLLAMA_INSTALL_TIMEOUT_SECS` | `900`                                               |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let default_provider = match std::env::var("AI_DEFAULT_PROVIDER") {
            Ok(name) => ProviderKind::from_name(&name)
                .expect("AI_DEFAULT_PROVIDER must be one of ollama, gemini, groq"),
            Err(_) => defaults.default_provider,
        };

        let dev_fallback_enabled: bool = std::env::var("AI_DEV_FALLBACK_ENABLED")
            .unwrap_or_else(|_| "false".into())
            .parse()
            .expect("AI_DEV_FALLBACK_ENABLED must be true or false");

        let timeouts = AiTimeouts {
            status: secs_var("AI_STATUS_TIMEOUT_SECS", defaults.timeouts.status),
            generate: secs_var("AI_GENERATE_TIMEOUT_SECS", defaults.timeouts.generate),
            pull: secs_var("OLLAMA_PULL_TIMEOUT_SECS", defaults.timeouts.pull),
            install: secs_var("OLLAMA_INSTALL_TIMEOUT_SECS", defaults.timeouts.install),
        };

        Self {
            default_provider,
            ollama_base_url: string_var("OLLAMA_BASE_URL", defaults.ollama_base_url),
            ollama_model: string_var("OLLAMA_MODEL", defaults.ollama_model),
            gemini_base_url: string_var("GEMINI_BASE_URL", defaults.gemini_base_url),
            gemini_model: string_var("GEMINI_MODEL", defaults.gemini_model),
            groq_base_url: string_var("GROQ_BASE_URL", defaults.groq_base_url),
            groq_model: string_var("GROQ_MODEL", defaults.groq_model),
            dev_fallback_enabled,
            gemini_fallback_key: optional_var("GEMINI_API_KEY"),
            groq_fallback_key: optional_var("GROQ_API_KEY"),
            timeouts,
        }
    }

    /// Configured default model for `kind`.
    pub fn model_for(&self, kind: ProviderKind) -> &str {
        match kind {
            ProviderKind::Ollama => &self.ollama_model,
            ProviderKind::Gemini => &self.gemini_model,
            ProviderKind::Groq => &self.groq_model,
        }
    }

    /// Server-wide development key for `kind`, if fallback is enabled.
    pub fn fallback_key(&self, kind: ProviderKind) -> Option<&str> {
        if !self.dev_fallback_enabled {
            return None;
        }
        match kind {
            ProviderKind::Ollama => None,
            ProviderKind::Gemini => self.gemini_fallback_key.as_deref(),
            ProviderKind::Groq => self.groq_fallback_key.as_deref(),
        }
    }
}

fn string_var(name: &str, default: String) -> String {
    std::env::var(name)
        .map(|v| v.trim_end_matches('/').to_string())
        .unwrap_or(default)
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn secs_var(name: &str, default: Duration) -> Duration {
    match std::env::var(name) {
        Ok(raw) => Duration::from_secs(
            raw.parse()
                .unwrap_or_else(|_| panic!("{name} must be a valid u64")),
        ),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_timeouts() {
        let t = AiTimeouts::default();
        assert_eq!(t.status.as_secs(), 5);
        assert_eq!(t.generate.as_secs(), 120);
        assert_eq!(t.pull.as_secs(), 1800);
        assert_eq!(t.install.as_secs(), 900);
    }

    #[test]
    fn fallback_keys_need_the_toggle() {
        let mut config = AiConfig {
            gemini_fallback_key: Some("dev-key".into()),
            ..AiConfig::default()
        };
        assert_eq!(config.fallback_key(ProviderKind::Gemini), None);

        config.dev_fallback_enabled = true;
        assert_eq!(config.fallback_key(ProviderKind::Gemini), Some("dev-key"));
        assert_eq!(config.fallback_key(ProviderKind::Groq), None);
        assert_eq!(config.fallback_key(ProviderKind::Ollama), None);
    }

    #[test]
    fn debug_output_hides_keys() {
        let config = AiConfig {
            groq_fallback_key: Some("gsk_secret".into()),
            ..AiConfig::default()
        };
        assert!(!format!("{config:?}").contains("gsk_secret"));
    }
}
