//! Periodic host resource sampling into the metrics ring.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::metrics::{MetricsRegistry, SystemSample};

/// Filesystem whose usage is reported.
const DISK_PATH: &str = "/";

/// Run the sampler until `cancel` is triggered.
pub async fn run(metrics: Arc<MetricsRegistry>, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "System sampler started");
    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("System sampler stopping");
                break;
            }
            _ = interval.tick() => {
                match tokio::task::spawn_blocking(take_sample).await {
                    Ok(sample) => metrics.push_sample(sample),
                    Err(e) => tracing::error!(error = %e, "System sampler: task failed"),
                }
            }
        }
    }
}

/// Read load, memory and disk figures. Unavailable readings are `None`.
pub fn take_sample() -> SystemSample {
    let (memory_total_kb, memory_available_kb) = std::fs::read_to_string("/proc/meminfo")
        .map(|text| parse_meminfo(&text))
        .unwrap_or((None, None));
    let (disk_total_bytes, disk_free_bytes) = disk_usage(DISK_PATH).unzip();

    SystemSample {
        sampled_at: Utc::now(),
        load_average: load_average(),
        memory_total_kb,
        memory_available_kb,
        disk_total_bytes,
        disk_free_bytes,
    }
}

/// Extract `MemTotal` and `MemAvailable` (kB) from `/proc/meminfo` text.
pub fn parse_meminfo(text: &str) -> (Option<u64>, Option<u64>) {
    let field = |name: &str| {
        text.lines()
            .find_map(|line| line.strip_prefix(name))
            .and_then(|rest| rest.trim_start_matches(':').split_whitespace().next())
            .and_then(|v| v.parse().ok())
    };
    (field("MemTotal"), field("MemAvailable"))
}

#[cfg(unix)]
fn load_average() -> Option<[f64; 3]> {
    let mut loads = [0f64; 3];
    // SAFETY: the buffer holds exactly the 3 samples requested.
    let n = unsafe { libc::getloadavg(loads.as_mut_ptr(), 3) };
    (n == 3).then_some(loads)
}

#[cfg(not(unix))]
fn load_average() -> Option<[f64; 3]> {
    None
}

/// `(total, available)` bytes of the filesystem holding `path`.
#[cfg(unix)]
fn disk_usage(path: &str) -> Option<(u64, u64)> {
    use std::ffi::CString;
    use std::mem::MaybeUninit;

    let c_path = CString::new(path).ok()?;
    let mut stat = MaybeUninit::<libc::statvfs>::uninit();
    // SAFETY: c_path is NUL-terminated and stat is only read on success.
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if ret != 0 {
        return None;
    }
    let stat = unsafe { stat.assume_init() };
    let block_size = stat.f_frsize as u64;
    Some((
        stat.f_blocks as u64 * block_size,
        stat.f_bavail as u64 * block_size,
    ))
}

#[cfg(not(unix))]
fn disk_usage(_path: &str) -> Option<(u64, u64)> {
    None
}
