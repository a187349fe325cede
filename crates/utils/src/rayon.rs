// Copyright 2024 Irreducible Inc.

use std::sync::OnceLock;

use rayon::{ThreadPoolBuildError, ThreadPoolBuilder};

/// Environment variable rayon reads its global worker count from.
pub const NUM_THREADS_ENV: &str = "RAYON_NUM_THREADS";

/// Whether `value` of [`NUM_THREADS_ENV`] asks for a single worker.
fn requests_single_worker(value: Option<&str>) -> bool {
	value.map(str::trim) == Some("1")
}

/// Prepares the global pool for a benchmark run; call it first thing in `main`.
///
/// With `RAYON_NUM_THREADS=1` the single worker is the calling thread, so every dispatched block
/// runs on the thread that reads the cycle counter. Any other setting is left to rayon.
///
/// The global pool can only be configured once, so the outcome is cached and the first error is
/// returned by reference on every call.
pub fn adjust_thread_pool() -> &'static Result<(), ThreadPoolBuildError> {
	static OUTCOME: OnceLock<Result<(), ThreadPoolBuildError>> = OnceLock::new();

	OUTCOME.get_or_init(|| {
		// Reading the variable directly: querying rayon would build the default global pool.
		let value = std::env::var(NUM_THREADS_ENV).ok();
		if !requests_single_worker(value.as_deref()) {
			return Ok(());
		}
		tracing::debug!("running dispatch on the calling thread");
		ThreadPoolBuilder::new()
			.num_threads(1)
			.use_current_thread()
			.build_global()
	})
}

/// Number of worker threads a dispatch on the global pool will fork across.
pub fn global_worker_count() -> usize {
	rayon::current_num_threads()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_single_worker_request() {
		assert!(requests_single_worker(Some("1")));
		assert!(requests_single_worker(Some(" 1\n")));
		assert!(!requests_single_worker(Some("4")));
		assert!(!requests_single_worker(Some("")));
		assert!(!requests_single_worker(None));
	}

	#[test]
	fn test_worker_count_is_positive() {
		assert!(global_worker_count() >= 1);
	}
}
