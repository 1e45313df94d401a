use std::sync::Arc;
use std::time::Duration;

use handcoach_core::crypto::ApiKeyCipher;
use handcoach_llm::ProviderRegistry;

use crate::config::ServerConfig;
use crate::metrics::MetricsRegistry;
use crate::middleware::rate_limit::RateLimiter;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: handcoach_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Seals and opens users' stored provider API keys.
    pub cipher: Arc<ApiKeyCipher>,
    pub providers: ProviderRegistry,
    pub metrics: Arc<MetricsRegistry>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(pool: handcoach_db::DbPool, config: ServerConfig) -> Self {
        let cipher = ApiKeyCipher::from_secret(&config.api_key_encryption_secret);
        let providers = ProviderRegistry::new(&config.ai);
        let rate_limiter = RateLimiter::new(
            config.rate_limit_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        );

        Self {
            pool,
            config: Arc::new(config),
            cipher: Arc::new(cipher),
            providers,
            metrics: Arc::new(MetricsRegistry::new()),
            rate_limiter: Arc::new(rate_limiter),
        }
    }
}
