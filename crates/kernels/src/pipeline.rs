// Copyright 2024-2025 Irreducible Inc.

//! Block kernels: the unit of work the [`crate::Dispatcher`] hands to each worker.

use std::marker::PhantomData;

use bytemuck::cast_slice_mut;

use crate::{
	arch,
	bit_trick::{apply_scalar, BitTrickForm, ThreeStep},
	buffer::AlignedBuffer,
	capability::{Capabilities, VectorIsa},
	element::ReluElement,
	error::Error,
};

/// Number of 32-bit lanes in a 256-bit vector register.
pub const LANES: usize = 8;

/// Elements processed by one invocation of the unrolled kernel (16 lane vectors).
pub const UNROLLED_BLOCK: usize = 16 * LANES;

/// Elements the vector kernels accept. The kernels work on the 32-bit pattern, which yields the
/// sign-bit ReLU for both `i32` and `f32`.
pub trait LaneElement: ReluElement<Bits = u32> {}

impl<T: ReluElement<Bits = u32>> LaneElement for T {}

/// A kernel that transforms whole blocks in place.
pub trait BlockKernel<T: ReluElement>: Send + Sync {
	fn name(&self) -> &'static str;

	/// The kernel only transforms prefixes whose length is a multiple of this value; the
	/// dispatcher routes the remaining elements to the scalar kernel.
	fn granularity(&self) -> usize;

	/// Applies ReLU to every element of `block`.
	///
	/// # Safety
	///
	/// - `block.len()` must be a multiple of [`Self::granularity`].
	/// - `block` must start on a 32-byte boundary.
	unsafe fn process(&self, block: &mut [T]);
}

/// Applies `kernel` to the largest prefix of `block` it accepts and the scalar 3-step form to
/// the rest.
///
/// # Safety
///
/// `block` must start on a 32-byte boundary.
#[inline]
pub unsafe fn process_with_remainder<T: ReluElement, K: BlockKernel<T> + ?Sized>(
	kernel: &K,
	block: &mut [T],
) {
	let head_len = block.len() - block.len() % kernel.granularity();
	let (head, tail) = block.split_at_mut(head_len);
	if !head.is_empty() {
		kernel.process(head);
	}
	apply_scalar::<ThreeStep, T>(tail);
}

/// The scalar bit-trick applied element by element.
#[derive(Debug, Clone, Copy)]
pub struct ScalarKernel<F: BitTrickForm> {
	_form: PhantomData<F>,
}

impl<F: BitTrickForm> ScalarKernel<F> {
	/// Fails if the form needs an instruction the CPU lacks.
	pub fn new() -> Result<Self, Error> {
		if F::REQUIRES_FUSED_AND_NOT && !Capabilities::detect().fused_and_not {
			return Err(Error::UnsupportedCapability {
				capability: "and-not (bmi1)",
				required_by: F::NAME,
			});
		}
		Ok(Self { _form: PhantomData })
	}
}

impl<F: BitTrickForm, T: ReluElement> BlockKernel<T> for ScalarKernel<F> {
	fn name(&self) -> &'static str {
		F::NAME
	}

	fn granularity(&self) -> usize {
		1
	}

	unsafe fn process(&self, block: &mut [T]) {
		apply_scalar::<F, T>(block);
	}
}

/// The software-pipelined 8-lane vector kernel.
#[derive(Debug, Clone, Copy)]
pub struct PipelineKernel {
	isa: VectorIsa,
}

impl PipelineKernel {
	/// Uses the widest vector ISA the host supports.
	pub fn new() -> Self {
		let isa = Capabilities::detect().best_vector_isa();
		tracing::debug!(isa = isa.name(), "selected pipeline kernel");
		Self { isa }
	}

	/// Fails if the host lacks `isa`.
	pub fn with_isa(isa: VectorIsa) -> Result<Self, Error> {
		Capabilities::detect().require_isa(isa, "pipeline")?;
		Ok(Self { isa })
	}

	pub fn isa(&self) -> VectorIsa {
		self.isa
	}

	/// Single-threaded pass over a whole buffer, remainder included.
	pub fn apply<T: LaneElement>(&self, buffer: &mut AlignedBuffer<T>) {
		// SAFETY: `AlignedBuffer` storage starts on a 64-byte boundary.
		unsafe { process_with_remainder(self, buffer.as_mut_slice()) }
	}
}

impl Default for PipelineKernel {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: LaneElement> BlockKernel<T> for PipelineKernel {
	fn name(&self) -> &'static str {
		"pipeline"
	}

	fn granularity(&self) -> usize {
		LANES
	}

	unsafe fn process(&self, block: &mut [T]) {
		let lanes: &mut [i32] = cast_slice_mut(block);
		match self.isa {
			#[cfg(target_arch = "x86_64")]
			VectorIsa::Avx2 => arch::x86_64::relu_pipeline_avx2(lanes),
			_ => arch::portable::relu_pipeline(lanes),
		}
	}
}

/// The fully unrolled 128-element kernel using a vector max against zero.
#[derive(Debug, Clone, Copy)]
pub struct UnrolledKernel {
	isa: VectorIsa,
}

impl UnrolledKernel {
	pub fn new() -> Self {
		Self {
			isa: Capabilities::detect().best_vector_isa(),
		}
	}

	pub fn with_isa(isa: VectorIsa) -> Result<Self, Error> {
		Capabilities::detect().require_isa(isa, "unrolled")?;
		Ok(Self { isa })
	}
}

impl Default for UnrolledKernel {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: LaneElement> BlockKernel<T> for UnrolledKernel {
	fn name(&self) -> &'static str {
		"unrolled"
	}

	fn granularity(&self) -> usize {
		UNROLLED_BLOCK
	}

	unsafe fn process(&self, block: &mut [T]) {
		let lanes: &mut [i32] = cast_slice_mut(block);
		match self.isa {
			#[cfg(target_arch = "x86_64")]
			VectorIsa::Avx2 => arch::x86_64::relu_unrolled_avx2(lanes),
			_ => arch::portable::relu_unrolled(lanes),
		}
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;
	use crate::bit_trick::TwoStep;

	const SCENARIO_INPUT: [i32; 16] = [-5, -4, -3, -2, -1, 0, 1, 2, 3, 4, 5, -6, -7, 8, 9, -10];
	const SCENARIO_OUTPUT: [i32; 16] = [0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 0, 0, 8, 9, 0];

	fn all_isas() -> Vec<VectorIsa> {
		[VectorIsa::Avx2, VectorIsa::Portable]
			.into_iter()
			.filter(|&isa| Capabilities::detect().supports_isa(isa))
			.collect()
	}

	#[test]
	fn test_scenario_pipeline() {
		for isa in all_isas() {
			let kernel = PipelineKernel::with_isa(isa).unwrap();
			let mut buffer = AlignedBuffer::from_slice(&SCENARIO_INPUT).unwrap();
			kernel.apply(&mut buffer);
			assert_eq!(&*buffer, &SCENARIO_OUTPUT, "isa = {isa:?}");
		}
	}

	#[test]
	fn test_pipeline_on_f32_bits() {
		let input = [-0.0f32, 0.0, -1.5, 2.5, f32::NEG_INFINITY, f32::INFINITY, -f32::NAN, 1e-30];
		let mut buffer = AlignedBuffer::from_slice(&input).unwrap();
		PipelineKernel::new().apply(&mut buffer);

		let expected: Vec<u32> = input
			.iter()
			.map(|&x| crate::relu::<TwoStep, f32>(x).to_bits())
			.collect();
		let actual: Vec<u32> = buffer.iter().map(|x| x.to_bits()).collect();
		assert_eq!(actual, expected);
	}

	#[test]
	fn test_short_block_is_scalar_only() {
		let mut buffer = AlignedBuffer::from_slice(&[-3, 4, -5]).unwrap();
		PipelineKernel::new().apply(&mut buffer);
		assert_eq!(&*buffer, &[0, 4, 0]);
	}

	#[test]
	fn test_unrolled_with_remainder() {
		let values: Vec<i32> = (0..300).map(|i| if i % 3 == 0 { -i } else { i }).collect();
		for isa in all_isas() {
			let kernel = UnrolledKernel::with_isa(isa).unwrap();
			let mut buffer = AlignedBuffer::from_slice(&values).unwrap();
			unsafe { process_with_remainder(&kernel, buffer.as_mut_slice()) };
			assert!(buffer.iter().zip(&values).all(|(&y, &x)| y == x.max(0)));
		}
	}

	proptest! {
		#[test]
		fn test_pipeline_matches_scalar(values in prop::collection::vec(any::<i32>(), 0..300)) {
			let mut expected = values.clone();
			apply_scalar::<ThreeStep, _>(&mut expected);

			for isa in all_isas() {
				let mut buffer = AlignedBuffer::from_slice(&values).unwrap();
				PipelineKernel::with_isa(isa).unwrap().apply(&mut buffer);
				prop_assert_eq!(&*buffer, expected.as_slice());
			}
		}
	}
}
