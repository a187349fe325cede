// Copyright 2024-2025 Irreducible Inc.

use rectify_maybe_rayon::ThreadPoolBuildError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("the CPU lacks the {capability} instruction set required by the {required_by} kernel")]
	UnsupportedCapability {
		capability: &'static str,
		required_by: &'static str,
	},
	#[error("block size {block_size} must be a positive multiple of {granularity} elements")]
	InvalidBlockSize {
		block_size: usize,
		granularity: usize,
	},
	#[error("a buffer of {len} elements exceeds the maximum allocation size")]
	AllocationTooLarge { len: usize },
	#[error("failed to build the worker pool: {0}")]
	ThreadPool(#[from] ThreadPoolBuildError),
}
