// Copyright 2025 Irreducible Inc.

use std::fmt::{self, Debug};

use rectify_kernels::ReluElement;
use rectify_maybe_rayon::prelude::*;
use rectify_utils::ensure;

use crate::error::Error;

/// Element count of the checksum regression run.
pub const CHECKSUM_LEN: usize = 524_288;

/// Sum after ReLU of [`CHECKSUM_LEN`] elements of the default quadratic pattern.
pub const EXPECTED_CHECKSUM: i64 = 114_433_787;

/// The first element on which two buffers differ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mismatch<T> {
	pub index: usize,
	pub left: T,
	pub right: T,
}

impl<T: Debug> fmt::Display for Mismatch<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "mismatch at {}: left={:?} right={:?}", self.index, self.left, self.right)
	}
}

/// Outcome of an element-by-element comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict<T> {
	Equal,
	Mismatch(Mismatch<T>),
}

impl<T> Verdict<T> {
	pub fn is_equal(&self) -> bool {
		matches!(self, Self::Equal)
	}
}

impl<T: Debug> fmt::Display for Verdict<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Equal => write!(f, "equal on every element"),
			Self::Mismatch(mismatch) => write!(f, "{mismatch}"),
		}
	}
}

/// Compares two buffers bit for bit and stops at the first difference.
pub fn compare<T: ReluElement>(left: &[T], right: &[T]) -> Result<Verdict<T>, Error> {
	ensure!(
		left.len() == right.len(),
		Error::LengthMismatch {
			left: left.len(),
			right: right.len(),
		}
	);

	let verdict = left
		.iter()
		.zip(right)
		.position(|(&l, &r)| !l.bits_eq(r))
		.map_or(Verdict::Equal, |index| {
			Verdict::Mismatch(Mismatch {
				index,
				left: left[index],
				right: right[index],
			})
		});
	Ok(verdict)
}

/// Sum of all elements, widened to `i64`.
pub fn checksum<T: Copy + Into<i64> + Sync>(data: &[T]) -> i64 {
	data.par_iter().map(|&x| -> i64 { x.into() }).sum()
}
