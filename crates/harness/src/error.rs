// Copyright 2025 Irreducible Inc.

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("CPU backend failed: {0}")]
	Kernels(#[from] rectify_kernels::Error),
	#[error("GPU backend failed: {0}")]
	Gpu(#[from] rectify_gpu::Error),
	#[error("cannot compare buffers of {left} and {right} elements")]
	LengthMismatch { left: usize, right: usize },
	#[error("a multi-sample measurement needs at least one trial")]
	NoTrials,
}
