use handcoach_core::session::DEFAULT_SESSION_TIMEOUT_MINS;
use handcoach_llm::AiConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// AI provider endpoints, models and timeouts.
    pub ai: AiConfig,
    /// Requests allowed per client IP per window (default: `120`).
    pub rate_limit_requests: u32,
    /// Rate limit window length in seconds (default: `60`).
    pub rate_limit_window_secs: u64,
    /// Inactivity after which a session is ended (default: `60`).
    pub session_timeout_mins: i64,
    /// Session sweep interval in seconds; `0` disables the sweeper.
    pub session_sweep_interval_secs: u64,
    /// System resource sample interval in seconds; `0` disables sampling.
    pub system_sample_interval_secs: u64,
    /// Validity of cached statistics in seconds (default: `3600`).
    pub stats_cache_ttl_secs: i64,
    /// Maximum accepted request body, which bounds hand uploads (default: 10 MiB).
    pub max_upload_bytes: usize,
    /// Secret the provider API-key cipher is derived from.
    pub api_key_encryption_secret: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `HOST`                        | `0.0.0.0`               |
    /// | `PORT`                        | `3000`                  |
    /// | `CORS_ORIGINS`                | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                    |
    /// | `RATE_LIMIT_REQUESTS`         | `120`                   |
    /// | `RATE_LIMIT_WINDOW_SECS`      | `60`                    |
    /// | `SESSION_TIMEOUT_MINS`        | `60`                    |
    /// | `SESSION_SWEEP_INTERVAL_SECS` | `300`                   |
    /// | `SYSTEM_SAMPLE_INTERVAL_SECS` | `60`                    |
    /// | `STATS_CACHE_TTL_SECS`        | `3600`                  |
    /// | `MAX_UPLOAD_BYTES`            | `10485760`              |
    /// | `API_KEY_ENCRYPTION_SECRET`   | **required**            |
    ///
    /// JWT and AI provider settings are documented on [`JwtConfig::from_env`]
    /// and [`AiConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics if a variable is set to an unparsable value or a required
    /// secret is missing.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let api_key_encryption_secret = std::env::var("API_KEY_ENCRYPTION_SECRET")
            .expect("API_KEY_ENCRYPTION_SECRET must be set in the environment");
        assert!(
            !api_key_encryption_secret.is_empty(),
            "API_KEY_ENCRYPTION_SECRET must not be empty"
        );

        Self {
            host,
            port: parse_var("PORT", 3000),
            cors_origins,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", 30),
            jwt: JwtConfig::from_env(),
            ai: AiConfig::from_env(),
            rate_limit_requests: parse_var("RATE_LIMIT_REQUESTS", 120),
            rate_limit_window_secs: parse_var("RATE_LIMIT_WINDOW_SECS", 60),
            session_timeout_mins: parse_var("SESSION_TIMEOUT_MINS", DEFAULT_SESSION_TIMEOUT_MINS),
            session_sweep_interval_secs: parse_var("SESSION_SWEEP_INTERVAL_SECS", 300),
            system_sample_interval_secs: parse_var("SYSTEM_SAMPLE_INTERVAL_SECS", 60),
            stats_cache_ttl_secs: parse_var("STATS_CACHE_TTL_SECS", 3600),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
            api_key_encryption_secret,
        }
    }
}

/// Read `name` and parse it, falling back to `default` when unset.
fn parse_var<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match std::env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => default,
    }
}

fn parse_value<T: std::str::FromStr>(name: &str, raw: &str) -> T {
    raw.trim()
        .parse()
        .unwrap_or_else(|_| panic!("{name} must be a valid {}", std::any::type_name::<T>()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trimmed_numbers() {
        let port: u16 = parse_value("PORT", " 8080 ");
        assert_eq!(port, 8080);
    }

    #[test]
    #[should_panic(expected = "PORT must be a valid u16")]
    fn rejects_out_of_range_port() {
        let _: u16 = parse_value("PORT", "70000");
    }
}
