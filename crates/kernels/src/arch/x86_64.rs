// Copyright 2024-2025 Irreducible Inc.

use std::arch::x86_64::*;

use crate::pipeline::{LANES, UNROLLED_BLOCK};

/// How many lane vectors ahead of the current load the pipeline prefetches (256 bytes, four
/// cache lines).
const PREFETCH_DISTANCE: usize = 8;

/// Cache lines covered by one [`UNROLLED_BLOCK`] of `i32`.
const UNROLLED_CACHE_LINES: usize = UNROLLED_BLOCK * std::mem::size_of::<i32>() / 64;

/// Software-pipelined ReLU over `block.len() / LANES` lane vectors of `block`.
///
/// Each steady-state iteration loads the next vector, masks the held one with
/// `cmpgt(held, 0) & held`, stores it back behind the load, prefetches ahead and rotates the
/// registers; the drain stage writes out the last held vector. A tail shorter than [`LANES`] is
/// left untouched.
///
/// # Safety
///
/// - The CPU must support AVX2.
/// - `block` must start on a 32-byte boundary. The loads and stores are the aligned variants, so
///   a misaligned block is undefined behaviour; this is not checked in release builds.
#[target_feature(enable = "avx2")]
pub unsafe fn relu_pipeline_avx2(block: &mut [i32]) {
	let vectors = block.len() / LANES;
	if vectors == 0 {
		return;
	}
	debug_assert_eq!(block.as_ptr() as usize % 32, 0, "pipeline block must be 32-byte aligned");

	let base = block.as_mut_ptr().cast::<__m256i>();
	let zero = _mm256_setzero_si256();

	// Warm-up.
	let mut held = _mm256_load_si256(base);

	// Steady state.
	for k in 1..vectors {
		let next = _mm256_load_si256(base.add(k));

		let keep = _mm256_cmpgt_epi32(held, zero);
		_mm256_store_si256(base.add(k - 1), _mm256_and_si256(held, keep));

		// A prefetch past the end is a harmless hint; `wrapping_add` keeps the address
		// computation itself defined.
		_mm_prefetch::<_MM_HINT_T0>(base.wrapping_add(k + PREFETCH_DISTANCE).cast::<i8>());

		held = next;
	}

	// Drain.
	let keep = _mm256_cmpgt_epi32(held, zero);
	_mm256_store_si256(base.add(vectors - 1), _mm256_and_si256(held, keep));
}

/// Fully unrolled ReLU over every whole [`UNROLLED_BLOCK`] of `block`: all cache lines of the
/// chunk are prefetched up front, then its 16 lane vectors go through `max(x, 0)`.
///
/// # Safety
///
/// Same as [`relu_pipeline_avx2`].
#[target_feature(enable = "avx2")]
pub unsafe fn relu_unrolled_avx2(block: &mut [i32]) {
	debug_assert_eq!(block.as_ptr() as usize % 32, 0, "unrolled block must be 32-byte aligned");

	let zero = _mm256_setzero_si256();
	for chunk in block.chunks_exact_mut(UNROLLED_BLOCK) {
		let base = chunk.as_mut_ptr();
		for line in 0..UNROLLED_CACHE_LINES {
			_mm_prefetch::<_MM_HINT_T0>(base.add(line * 16).cast::<i8>());
		}

		let vectors = base.cast::<__m256i>();
		for k in 0..UNROLLED_BLOCK / LANES {
			let x = _mm256_load_si256(vectors.add(k));
			_mm256_store_si256(vectors.add(k), _mm256_max_epi32(x, zero));
		}
	}
}
