// Copyright 2025 Irreducible Inc.

pub trait ParallelSlice<T: Sync> {
	fn as_parallel_slice(&self) -> &[T];

	#[inline(always)]
	fn par_chunks(&self, chunk_size: usize) -> std::slice::Chunks<'_, T> {
		self.as_parallel_slice().chunks(chunk_size)
	}
}

impl<T: Sync> ParallelSlice<T> for [T] {
	#[inline(always)]
	fn as_parallel_slice(&self) -> &[T] {
		self
	}
}

pub trait ParallelSliceMut<T: Send> {
	fn as_parallel_slice_mut(&mut self) -> &mut [T];

	#[inline(always)]
	fn par_chunks_mut(&mut self, chunk_size: usize) -> std::slice::ChunksMut<'_, T> {
		self.as_parallel_slice_mut().chunks_mut(chunk_size)
	}

	#[inline(always)]
	fn par_chunks_exact_mut(&mut self, chunk_size: usize) -> std::slice::ChunksExactMut<'_, T> {
		self.as_parallel_slice_mut().chunks_exact_mut(chunk_size)
	}
}

impl<T: Send> ParallelSliceMut<T> for [T] {
	#[inline(always)]
	fn as_parallel_slice_mut(&mut self) -> &mut [T] {
		self
	}
}
