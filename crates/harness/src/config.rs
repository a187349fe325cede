// Copyright 2025 Irreducible Inc.

use crate::populate::Pattern;

/// Element count of the regression run.
pub const DEFAULT_LEN: usize = 524_288;

pub const DEFAULT_TRIALS: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
	/// Elements per buffer.
	pub len: usize,
	/// Timed executions in a multi-sample run.
	pub trials: usize,
	/// Contents written into the buffer before every trial.
	pub pattern: Pattern,
}

impl Default for HarnessConfig {
	fn default() -> Self {
		Self {
			len: DEFAULT_LEN,
			trials: DEFAULT_TRIALS,
			pattern: Pattern::default(),
		}
	}
}
