// Copyright 2025 Irreducible Inc.
// The code is initially based on `maybe-rayon` crate, https://github.com/shssoichiro/maybe-rayon

//! This crate provides the subset of the `rayon` API used by the ReLU dispatcher and the
//! benchmark harness, so that both can be compiled without `rayon`.
//! Disabling the `rayon` feature turns every parallel loop into a plain sequential iterator,
//! which makes per-block profiles and cycle counts much easier to read.

cfg_if::cfg_if! {
	if #[cfg(any(not(feature = "rayon"), all(target_arch="wasm32", not(target_feature = "atomics"))))] {
		pub mod iter;
		pub mod slice;

		pub mod prelude {
			pub use super::{iter::*, slice::*};
		}

		#[derive(Default)]
		pub struct ThreadPoolBuilder();
		impl ThreadPoolBuilder {
			#[inline(always)]
			pub const fn new() -> Self {
				Self()
			}

			#[inline(always)]
			pub const fn build(self) -> Result<ThreadPool, ThreadPoolBuildError> {
				Ok(ThreadPool())
			}

			#[inline(always)]
			pub const fn num_threads(self, _num_threads: usize) -> Self {
				Self()
			}
		}

		#[derive(Debug)]
		pub struct ThreadPool();
		impl ThreadPool {
			#[inline(always)]
			pub fn install<OP, R>(&self, op: OP) -> R
			where
				OP: FnOnce() -> R + Send,
				R: Send,
			{
				op()
			}

			#[inline(always)]
			pub const fn current_num_threads(&self) -> usize {
				1
			}
		}

		#[derive(Debug, Default)]
		pub struct ThreadPoolBuildError;
		impl std::fmt::Display for ThreadPoolBuildError {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				write!(f, "ThreadPoolBuildError")
			}
		}
		impl std::error::Error for ThreadPoolBuildError {}

		#[inline(always)]
		pub const fn current_num_threads() -> usize {
			1
		}

		#[inline(always)]
		pub fn join<A, B, RA, RB>(oper_a: A, oper_b: B) -> (RA, RB)
		where
			A: FnOnce() -> RA + Send,
			B: FnOnce() -> RB + Send,
			RA: Send,
			RB: Send,
		{
			(oper_a(), oper_b())
		}
	} else {
		pub use rayon::*;
	}
}
