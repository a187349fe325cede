// Copyright 2024-2025 Irreducible Inc.

//! Branchless scalar ReLU.
//!
//! Both forms start by broadcasting the sign bit over the whole word with an arithmetic shift
//! right by `width - 1`, which yields all ones for negative inputs and zero otherwise:
//!
//! - [`TwoStep`]: `x & !mask` as one fused and-not (`andn` with BMI1, `bic` on aarch64);
//! - [`ThreeStep`]: an explicit `not` of the mask followed by `and`, portable to any ISA.
//!
//! The result is `x` when the sign bit is clear and the zero of the type otherwise. Only the sign
//! bit is tested, so `-0.0` maps to `+0.0` and NaNs keep or lose their payload depending on their
//! sign bit, unlike an IEEE `x >= 0` comparison.

use std::fmt::Debug;

use crate::element::{ReluElement, SignBits};

/// A compile-time choice of the scalar ReLU instruction sequence.
pub trait BitTrickForm: Copy + Default + Debug + Send + Sync + 'static {
	const NAME: &'static str;

	/// Whether the form relies on a fused and-not instruction being present.
	const REQUIRES_FUSED_AND_NOT: bool;

	fn apply<T: ReluElement>(x: T) -> T;
}

/// Shift, then fused and-not.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TwoStep;

/// Shift, not, and.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ThreeStep;

impl BitTrickForm for TwoStep {
	const NAME: &'static str = "2-step";
	const REQUIRES_FUSED_AND_NOT: bool = true;

	#[inline(always)]
	fn apply<T: ReluElement>(x: T) -> T {
		let bits = x.to_bits();
		T::from_bits(bits.and_not(bits.sign_mask()))
	}
}

impl BitTrickForm for ThreeStep {
	const NAME: &'static str = "3-step";
	const REQUIRES_FUSED_AND_NOT: bool = false;

	#[inline(always)]
	fn apply<T: ReluElement>(x: T) -> T {
		let bits = x.to_bits();
		let mask = bits.sign_mask();
		let keep = mask.not();
		T::from_bits(bits.and(keep))
	}
}

/// ReLU of a single element with the form `F`.
#[inline(always)]
pub fn relu<F: BitTrickForm, T: ReluElement>(x: T) -> T {
	F::apply(x)
}

/// Applies the form `F` to every element of `data` on the calling thread.
pub fn apply_scalar<F: BitTrickForm, T: ReluElement>(data: &mut [T]) {
	for x in data {
		*x = F::apply(*x);
	}
}

/// Call-site selection between the two forms, for configuration surfaces that pick a form at
/// runtime. The match happens once per buffer, never per element.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ScalarForm {
	TwoStep,
	#[default]
	ThreeStep,
}

impl ScalarForm {
	pub const fn name(self) -> &'static str {
		match self {
			Self::TwoStep => TwoStep::NAME,
			Self::ThreeStep => ThreeStep::NAME,
		}
	}

	pub const fn requires_fused_and_not(self) -> bool {
		match self {
			Self::TwoStep => TwoStep::REQUIRES_FUSED_AND_NOT,
			Self::ThreeStep => ThreeStep::REQUIRES_FUSED_AND_NOT,
		}
	}

	pub fn apply_slice<T: ReluElement>(self, data: &mut [T]) {
		match self {
			Self::TwoStep => apply_scalar::<TwoStep, T>(data),
			Self::ThreeStep => apply_scalar::<ThreeStep, T>(data),
		}
	}
}
