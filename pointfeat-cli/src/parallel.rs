//! Worker pool for batch feature extraction
//!
//! Each batch builds its own fixed-size rayon pool; the global pool is never
//! configured.

use pointfeat_core::{Error, FeatureConfig, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Worker pool configuration
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerPoolConfig {
    /// Number of worker threads
    pub num_workers: usize,
    /// Thread stack size in bytes (None = rayon default)
    pub stack_size: Option<usize>,
    /// Thread name prefix
    pub thread_name_prefix: String,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            num_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            stack_size: None,
            thread_name_prefix: "pointfeat-worker".to_string(),
        }
    }
}

impl WorkerPoolConfig {
    /// Set number of workers
    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    /// Set stack size
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }

    /// Set thread name prefix
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Build the thread pool
    pub fn build(&self) -> Result<ThreadPool> {
        if self.num_workers == 0 {
            return Err(Error::InvalidConfig(
                "num_workers must be greater than 0".to_string(),
            ));
        }

        let mut builder = ThreadPoolBuilder::new().num_threads(self.num_workers);

        if let Some(stack_size) = self.stack_size {
            builder = builder.stack_size(stack_size);
        }

        if !self.thread_name_prefix.is_empty() {
            let prefix = self.thread_name_prefix.clone();
            builder = builder.thread_name(move |index| format!("{}-{}", prefix, index));
        }

        builder
            .build()
            .map_err(|e| Error::Algorithm(format!("Failed to create worker pool: {}", e)))
    }
}

impl From<&FeatureConfig> for WorkerPoolConfig {
    fn from(config: &FeatureConfig) -> Self {
        Self::default().with_workers(config.num_workers)
    }
}

/// Map `f` over `data` on `pool`, preserving input order in the result
pub fn parallel_map_in<T, U, F>(pool: &ThreadPool, data: &[T], f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    pool.install(|| data.par_iter().map(f).collect())
}
