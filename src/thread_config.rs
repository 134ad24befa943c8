use serde::{Deserialize, Serialize};
use std::sync::Once;
use tracing::{error, info};

static THREAD_POOL_INIT: Once = Once::new();

/// Worker pool configuration for the per-column profiling fan-out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadPoolConfig {
    /// Number of Rayon threads (0 = auto-detect)
    pub worker_threads: usize,
    /// Worker thread name prefix
    pub thread_prefix: String,
    /// Stack size for worker threads (bytes)
    pub stack_size: usize,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0, // Auto-detect
            thread_prefix: "datalens-cpu".to_string(),
            stack_size: 8 * 1024 * 1024, // 8MB
        }
    }
}

/// Initialize the global worker pool with the given configuration.
///
/// Without this, profiling uses Rayon's default global pool.
pub fn initialize_thread_pools(
    config: &ThreadPoolConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut result = Ok(());

    THREAD_POOL_INIT.call_once(|| {
        match configure_rayon(config) {
            Ok(_) => info!("worker thread pool initialized"),
            Err(e) => {
                error!("failed to initialize worker thread pool: {}", e);
                result = Err(e);
            }
        }
    });

    result
}

fn configure_rayon(config: &ThreadPoolConfig) -> Result<(), Box<dyn std::error::Error>> {
    let num_threads = if config.worker_threads == 0 {
        num_cpus::get()
    } else {
        config.worker_threads
    };

    let thread_prefix = config.thread_prefix.clone();
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(move |idx| format!("{}-{}", thread_prefix, idx))
        .stack_size(config.stack_size)
        .build_global()?;

    info!(
        "worker thread pool configured: {} threads, {}MB stack size",
        num_threads,
        config.stack_size / (1024 * 1024)
    );

    Ok(())
}
