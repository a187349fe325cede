// Copyright 2025 Irreducible Inc.

//! Deterministic buffer contents. Every element is a pure function of its index, so buffers
//! filled with the same pattern are identical no matter how the fill is split across threads.

use std::num::NonZeroU64;

use rectify_kernels::ReluElement;
use rectify_maybe_rayon::prelude::*;

const DEFAULT_MODULUS: NonZeroU64 = match NonZeroU64::new(2000) {
	Some(modulus) => modulus,
	None => panic!("modulus is non-zero"),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
	/// `(i * i mod modulus) - offset`: a mix of negative and positive values without long runs.
	Quadratic { modulus: NonZeroU64, offset: i64 },
	/// `i - offset`: negative up to `offset`, positive after it.
	Linear { offset: i64 },
}

impl Pattern {
	/// The pattern of the regression checksum run.
	pub const QUADRATIC: Self = Self::Quadratic {
		modulus: DEFAULT_MODULUS,
		offset: 1000,
	};

	/// The pattern of the combined CPU and GPU run.
	pub const LINEAR: Self = Self::Linear { offset: 1_000_000 };

	pub fn value(self, index: usize) -> i64 {
		let i = index as u64;
		match self {
			Self::Quadratic { modulus, offset } => (i.wrapping_mul(i) % modulus) as i64 - offset,
			Self::Linear { offset } => i as i64 - offset,
		}
	}

	/// Overwrites every element of `data` in parallel.
	pub fn fill<T: PatternElement>(self, data: &mut [T]) {
		data.par_iter_mut()
			.enumerate()
			.for_each(|(i, x)| *x = T::from_pattern(self.value(i)));
	}
}

impl Default for Pattern {
	fn default() -> Self {
		Self::QUADRATIC
	}
}

/// Element types a [`Pattern`] can be written into.
pub trait PatternElement: ReluElement {
	/// Integer types narrower than the value keep its low bits; floats take the nearest value.
	fn from_pattern(value: i64) -> Self;
}

macro_rules! impl_pattern_element {
	($($ty:ty),*) => {
		$(
			impl PatternElement for $ty {
				#[inline]
				fn from_pattern(value: i64) -> Self {
					value as $ty
				}
			}
		)*
	};
}

impl_pattern_element!(i8, i16, i32, i64, f32, f64);
