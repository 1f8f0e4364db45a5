//! Keep-alive idle timeout heuristic.
//!
//! ```text
//! timeout = ceil(ceiling / (1 + e^(2 * (active - (cpus - 1)))))
//! ```
//!
//! Close to `ceiling` while there is spare concurrency, dropping sharply once
//! active connections pass the usable CPU count. Never below one second.

use std::time::Duration;

/// Logical CPUs available to the process.
pub fn available_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

pub fn keep_alive_timeout(active_connections: usize, available_cpus: usize, ceiling_secs: u64) -> Duration {
    let usable = available_cpus as f64 - 1.0;
    let exponent = 2.0 * (active_connections as f64 - usable);
    let secs = (ceiling_secs as f64 / (1.0 + exponent.exp())).ceil();
    Duration::from_secs(secs.max(1.0) as u64)
}
