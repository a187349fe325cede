// Copyright 2024-2025 Irreducible Inc.

//! Lane-array renditions of the vector kernels, used when no SIMD extension is available.
//! They keep the same staging as the SIMD code so that both produce the same stores in the same
//! order, but there is no portable prefetch hint.

use crate::pipeline::{LANES, UNROLLED_BLOCK};

type Lanes = [i32; LANES];

/// Compare-greater-than-zero mask, then `and`: the lane-wise form of the vector ReLU.
#[inline(always)]
fn relu_lanes(held: Lanes) -> Lanes {
	held.map(|x| x & -((x > 0) as i32))
}

#[inline(always)]
fn load(block: &[i32], k: usize) -> Lanes {
	let mut lanes = [0; LANES];
	lanes.copy_from_slice(&block[k * LANES..(k + 1) * LANES]);
	lanes
}

#[inline(always)]
fn store(block: &mut [i32], k: usize, lanes: Lanes) {
	block[k * LANES..(k + 1) * LANES].copy_from_slice(&lanes);
}

/// Software-pipelined ReLU over `block.len() / LANES` lane vectors. A tail shorter than
/// [`LANES`] is left untouched.
pub fn relu_pipeline(block: &mut [i32]) {
	let vectors = block.len() / LANES;
	if vectors == 0 {
		return;
	}

	let mut held = load(block, 0);
	for k in 1..vectors {
		let next = load(block, k);
		store(block, k - 1, relu_lanes(held));
		held = next;
	}
	store(block, vectors - 1, relu_lanes(held));
}

/// Vector-max-against-zero over every whole [`UNROLLED_BLOCK`] of `block`.
pub fn relu_unrolled(block: &mut [i32]) {
	for chunk in block.chunks_exact_mut(UNROLLED_BLOCK) {
		for lanes in chunk.chunks_exact_mut(LANES) {
			for x in lanes {
				*x = (*x).max(0);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_pipeline_leaves_tail() {
		let mut data: Vec<i32> = (-10..10).collect();
		relu_pipeline(&mut data);
		let expected: Vec<i32> = (-10..10)
			.enumerate()
			.map(|(i, x)| if i < 16 { x.max(0) } else { x })
			.collect();
		assert_eq!(data, expected);
	}

	#[test]
	fn test_pipeline_single_vector() {
		let mut data = [i32::MIN, -1, 0, 1, i32::MAX, -7, 7, -8];
		relu_pipeline(&mut data);
		assert_eq!(data, [0, 0, 0, 1, i32::MAX, 0, 7, 0]);
	}

	#[test]
	fn test_unrolled_whole_blocks_only() {
		let mut data = vec![-1; UNROLLED_BLOCK + LANES];
		relu_unrolled(&mut data);
		assert!(data[..UNROLLED_BLOCK].iter().all(|&x| x == 0));
		assert!(data[UNROLLED_BLOCK..].iter().all(|&x| x == -1));
	}
}
