// Copyright 2024-2025 Irreducible Inc.

//! Bit-pattern views of the supported element types.
//!
//! Every supported element keeps its sign in the most significant bit, so the ReLU kernels never
//! look at values: they operate on an unsigned integer of the same width obtained with
//! [`bytemuck::must_cast`], which is a reinterpretation of the bits and never a numeric
//! conversion.

use std::fmt::Debug;

use bytemuck::{must_cast, Pod};
use cfg_if::cfg_if;

cfg_if! {
	if #[cfg(all(target_arch = "x86_64", target_feature = "bmi1"))] {
		#[inline(always)]
		fn and_not_u32(mask: u32, x: u32) -> u32 {
			#[allow(unused_unsafe)]
			unsafe {
				std::arch::x86_64::_andn_u32(mask, x)
			}
		}

		#[inline(always)]
		fn and_not_u64(mask: u64, x: u64) -> u64 {
			#[allow(unused_unsafe)]
			unsafe {
				std::arch::x86_64::_andn_u64(mask, x)
			}
		}
	} else {
		// Compiles to `bic` on aarch64 and to `andn` wherever the target enables BMI1.
		#[inline(always)]
		fn and_not_u32(mask: u32, x: u32) -> u32 {
			!mask & x
		}

		#[inline(always)]
		fn and_not_u64(mask: u64, x: u64) -> u64 {
			!mask & x
		}
	}
}

/// Unsigned bit pattern of an element, with the sign-mask operations the ReLU forms are built
/// from. All widths share this one implementation.
pub trait SignBits: Pod + Eq + Debug + Send + Sync {
	const WIDTH: u32;
	const ZERO: Self;

	/// Arithmetic shift right by `WIDTH - 1`: all ones if the sign bit is set, zero otherwise.
	fn sign_mask(self) -> Self;

	/// `!mask & self`, issued as a single fused and-not where the target has one.
	fn and_not(self, mask: Self) -> Self;

	fn not(self) -> Self;

	fn and(self, other: Self) -> Self;
}

macro_rules! impl_sign_bits {
	($bits:ty, $signed:ty, $fused:ident, $wide:ty) => {
		impl SignBits for $bits {
			const WIDTH: u32 = <$bits>::BITS;
			const ZERO: Self = 0;

			#[inline(always)]
			fn sign_mask(self) -> Self {
				must_cast::<$signed, $bits>(must_cast::<$bits, $signed>(self) >> (Self::WIDTH - 1))
			}

			#[inline(always)]
			fn and_not(self, mask: Self) -> Self {
				// Narrow widths are widened the way a 32-bit register holds them; the high bits
				// of the result are discarded.
				$fused(mask as $wide, self as $wide) as $bits
			}

			#[inline(always)]
			fn not(self) -> Self {
				!self
			}

			#[inline(always)]
			fn and(self, other: Self) -> Self {
				self & other
			}
		}
	};
}

impl_sign_bits!(u8, i8, and_not_u32, u32);
impl_sign_bits!(u16, i16, and_not_u32, u32);
impl_sign_bits!(u32, i32, and_not_u32, u32);
impl_sign_bits!(u64, i64, and_not_u64, u64);

/// A numeric type the ReLU kernels accept: `i8`, `i16`, `i32`, `i64`, `f32` or `f64`.
pub trait ReluElement: Pod + PartialEq + Debug + Send + Sync + 'static {
	type Bits: SignBits;

	const NAME: &'static str;
	const ZERO: Self;

	fn to_bits(self) -> Self::Bits;

	fn from_bits(bits: Self::Bits) -> Self;

	/// Whether the most significant bit is set. For floats this is true for `-0.0` and for
	/// negative-signed NaNs.
	#[inline(always)]
	fn sign_bit(self) -> bool {
		self.to_bits().sign_mask() != <Self::Bits as SignBits>::ZERO
	}

	/// Bitwise equality, so that NaN payloads compare equal to themselves.
	#[inline(always)]
	fn bits_eq(self, other: Self) -> bool {
		self.to_bits() == other.to_bits()
	}
}

macro_rules! impl_relu_element {
	($($ty:ty => $bits:ty),* $(,)?) => {
		$(
			impl ReluElement for $ty {
				type Bits = $bits;

				const NAME: &'static str = stringify!($ty);
				const ZERO: Self = 0 as $ty;

				#[inline(always)]
				fn to_bits(self) -> $bits {
					must_cast(self)
				}

				#[inline(always)]
				fn from_bits(bits: $bits) -> Self {
					must_cast(bits)
				}
			}
		)*
	};
}

impl_relu_element!(
	i8 => u8,
	i16 => u16,
	i32 => u32,
	i64 => u64,
	f32 => u32,
	f64 => u64,
);
