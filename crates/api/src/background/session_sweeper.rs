//! Periodic end of sessions idle past the inactivity timeout.

use std::time::Duration;

use chrono::Utc;
use handcoach_core::session::timeout_cutoff;
use handcoach_db::repositories::SessionRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// End every active session idle for longer than `timeout`.
///
/// Shared by the sweeper loop and the admin cleanup endpoint.
pub async fn sweep_once(pool: &PgPool, timeout: chrono::Duration) -> Result<u64, sqlx::Error> {
    let cutoff = timeout_cutoff(Utc::now(), timeout);
    SessionRepo::end_inactive(pool, cutoff).await
}

/// Run the sweeper until `cancel` is triggered.
pub async fn run(
    pool: PgPool,
    timeout: chrono::Duration,
    every: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        timeout_mins = timeout.num_minutes(),
        interval_secs = every.as_secs(),
        "Session sweeper started"
    );

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                match sweep_once(&pool, timeout).await {
                    Ok(ended) if ended > 0 => {
                        tracing::info!(ended, "Session sweeper: ended idle sessions");
                    }
                    Ok(_) => tracing::debug!("Session sweeper: nothing to end"),
                    Err(e) => tracing::error!(error = %e, "Session sweeper: sweep failed"),
                }
            }
        }
    }
}
