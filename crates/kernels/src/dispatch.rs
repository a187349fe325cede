// Copyright 2024-2025 Irreducible Inc.

//! Block-parallel fork-join over a buffer.
//!
//! The buffer is cut into consecutive blocks of `block_size` elements (the last one possibly
//! shorter). Blocks are disjoint, so workers never touch the same element and no locking is
//! needed; the only synchronisation point is the join at the end of [`Dispatcher::run`].

use rectify_maybe_rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use rectify_utils::ensure;
use tracing::instrument;

use crate::{
	buffer::AlignedBuffer,
	element::ReluElement,
	error::Error,
	pipeline::{process_with_remainder, BlockKernel, LANES},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
	/// Elements per block. Must be a positive multiple of the kernel granularity.
	pub block_size: usize,
	/// Size of a dedicated worker pool; `None` runs on the global rayon pool.
	pub num_threads: Option<usize>,
}

impl Default for DispatchConfig {
	fn default() -> Self {
		Self {
			block_size: 256,
			num_threads: None,
		}
	}
}

#[derive(Debug)]
pub struct Dispatcher {
	block_size: usize,
	pool: Option<ThreadPool>,
}

impl Dispatcher {
	pub fn new(config: DispatchConfig) -> Result<Self, Error> {
		ensure!(
			config.block_size > 0 && config.block_size % LANES == 0,
			Error::InvalidBlockSize {
				block_size: config.block_size,
				granularity: LANES,
			}
		);

		let pool = config
			.num_threads
			.map(|num_threads| ThreadPoolBuilder::new().num_threads(num_threads).build())
			.transpose()?;

		Ok(Self {
			block_size: config.block_size,
			pool,
		})
	}

	pub fn block_size(&self) -> usize {
		self.block_size
	}

	/// Number of workers the blocks are spread over.
	pub fn worker_count(&self) -> usize {
		match &self.pool {
			Some(pool) => pool.current_num_threads(),
			None => rectify_maybe_rayon::current_num_threads(),
		}
	}

	/// Applies `kernel` to every block of `buffer` in parallel and returns once all blocks are
	/// done. Elements of a block past the kernel's granularity go through the scalar kernel.
	pub fn run<T, K>(&self, kernel: &K, buffer: &mut AlignedBuffer<T>) -> Result<(), Error>
	where
		T: ReluElement,
		K: BlockKernel<T>,
	{
		// SAFETY: `AlignedBuffer` storage starts on a 64-byte boundary.
		unsafe { self.run_unchecked(kernel, buffer.as_mut_slice()) }
	}

	/// Same as [`Self::run`] over caller-provided memory.
	///
	/// # Safety
	///
	/// `data` must start on a 32-byte boundary whenever `kernel` is a vector kernel.
	#[instrument(
		skip_all,
		level = "debug",
		fields(kernel = kernel.name(), len = data.len(), block_size = self.block_size)
	)]
	pub unsafe fn run_unchecked<T, K>(&self, kernel: &K, data: &mut [T]) -> Result<(), Error>
	where
		T: ReluElement,
		K: BlockKernel<T>,
	{
		let granularity = kernel.granularity();
		ensure!(
			self.block_size % granularity == 0,
			Error::InvalidBlockSize {
				block_size: self.block_size,
				granularity,
			}
		);

		let block_size = self.block_size;
		let mut fork_join = move || {
			data.par_chunks_mut(block_size).for_each(|block| {
				// SAFETY: every block starts at a multiple of `block_size` elements from an
				// aligned base, and `block_size` is a multiple of the lane width.
				unsafe { process_with_remainder(kernel, block) }
			})
		};

		match &self.pool {
			Some(pool) => pool.install(fork_join),
			None => fork_join(),
		}

		Ok(())
	}
}
