/// Worker configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Delay between queue polls in milliseconds (default: `1000`).
    pub poll_interval_ms: u64,
    /// Maximum tasks executing at once (default: `4`).
    pub concurrency: usize,
    /// How long shutdown waits for in-flight tasks in seconds (default: `30`).
    pub shutdown_grace_secs: u64,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default |
    /// |-----------------------------|---------|
    /// | `WORKER_POLL_INTERVAL_MS`   | `1000`  |
    /// | `WORKER_CONCURRENCY`        | `4`     |
    /// | `WORKER_SHUTDOWN_GRACE_SECS`| `30`    |
    pub fn from_env() -> Self {
        let poll_interval_ms: u64 = std::env::var("WORKER_POLL_INTERVAL_MS")
            .unwrap_or_else(|_| "1000".into())
            .parse()
            .expect("WORKER_POLL_INTERVAL_MS must be a valid u64");

        let concurrency: usize = std::env::var("WORKER_CONCURRENCY")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .expect("WORKER_CONCURRENCY must be a valid usize");

        let shutdown_grace_secs: u64 = std::env::var("WORKER_SHUTDOWN_GRACE_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("WORKER_SHUTDOWN_GRACE_SECS must be a valid u64");

        Self {
            poll_interval_ms,
            concurrency: concurrency.max(1),
            shutdown_grace_secs,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            concurrency: 4,
            shutdown_grace_secs: 30,
        }
    }
}
