// Copyright 2025 Irreducible Inc.

//! The execution strategies a harness run can time and compare.

use std::sync::{Mutex, PoisonError};

use rectify_gpu::{DeviceInfo, GpuBackend};
use rectify_kernels::{AlignedBuffer, BlockKernel, Capabilities, Dispatcher, ReluElement, ScalarForm};
use tracing::info;

use crate::error::Error;

/// Applies ReLU in place to a whole buffer.
pub trait Backend<T: ReluElement> {
	fn name(&self) -> String;

	fn run(&self, buffer: &mut AlignedBuffer<T>) -> Result<(), Error>;
}

/// Single-threaded scalar bit-trick over the buffer.
#[derive(Debug, Clone, Copy)]
pub struct ScalarBackend {
	form: ScalarForm,
}

impl ScalarBackend {
	/// Fails if the CPU lacks an instruction `form` needs.
	pub fn new(form: ScalarForm) -> Result<Self, Error> {
		Capabilities::detect().require_form(form)?;
		Ok(Self { form })
	}
}

impl<T: ReluElement> Backend<T> for ScalarBackend {
	fn name(&self) -> String {
		format!("scalar {} ({})", self.form.name(), T::NAME)
	}

	fn run(&self, buffer: &mut AlignedBuffer<T>) -> Result<(), Error> {
		self.form.apply_slice(buffer.as_mut_slice());
		Ok(())
	}
}

/// A block kernel run block-parallel by a [`Dispatcher`].
#[derive(Debug)]
pub struct DispatchBackend<K> {
	dispatcher: Dispatcher,
	kernel: K,
}

impl<K> DispatchBackend<K> {
	pub fn new(dispatcher: Dispatcher, kernel: K) -> Self {
		Self { dispatcher, kernel }
	}

	pub fn dispatcher(&self) -> &Dispatcher {
		&self.dispatcher
	}
}

impl<T: ReluElement, K: BlockKernel<T>> Backend<T> for DispatchBackend<K> {
	fn name(&self) -> String {
		format!(
			"{} ({}, blocks of {}, {} workers)",
			BlockKernel::<T>::name(&self.kernel),
			T::NAME,
			self.dispatcher.block_size(),
			self.dispatcher.worker_count()
		)
	}

	fn run(&self, buffer: &mut AlignedBuffer<T>) -> Result<(), Error> {
		self.dispatcher.run(&self.kernel, buffer)?;
		Ok(())
	}
}

/// Offload of `i32` buffers to a compute device.
#[derive(Debug, Default)]
pub struct GpuOffload {
	backend: GpuBackend,
	last_device: Mutex<Option<DeviceInfo>>,
}

impl GpuOffload {
	pub fn new(backend: GpuBackend) -> Self {
		Self {
			backend,
			last_device: Mutex::new(None),
		}
	}

	/// The device the most recent successful run executed on.
	pub fn last_device(&self) -> Option<DeviceInfo> {
		self.last_device
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}
}

impl Backend<i32> for GpuOffload {
	fn name(&self) -> String {
		format!("gpu (work groups of {})", self.backend.config().workgroup_size)
	}

	fn run(&self, buffer: &mut AlignedBuffer<i32>) -> Result<(), Error> {
		let run = self.backend.run(buffer.as_mut_slice())?;
		info!(device = %run.device, "offload complete");
		*self
			.last_device
			.lock()
			.unwrap_or_else(PoisonError::into_inner) = Some(run.device);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use rectify_kernels::{DispatchConfig, PipelineKernel};

	use super::*;

	#[test]
	fn test_scalar_and_dispatch_agree() {
		let values: Vec<f32> = (0..1000).map(|i| (i as f32 - 500.0) * 0.25).collect();

		let mut scalar = AlignedBuffer::from_slice(&values).unwrap();
		ScalarBackend::new(ScalarForm::ThreeStep)
			.unwrap()
			.run(&mut scalar)
			.unwrap();

		let dispatch = DispatchBackend::new(
			Dispatcher::new(DispatchConfig::default()).unwrap(),
			PipelineKernel::new(),
		);
		let mut vector = AlignedBuffer::from_slice(&values).unwrap();
		dispatch.run(&mut vector).unwrap();

		assert_eq!(&*scalar, &*vector);
		assert!(Backend::<f32>::name(&dispatch).starts_with("pipeline (f32, blocks of 256"));
	}

	#[test]
	fn test_gpu_offload_records_device() {
		let gpu = GpuOffload::default();
		assert_eq!(gpu.last_device(), None);

		let mut buffer = AlignedBuffer::from_slice(&[-3i32; 128]).unwrap();
		match gpu.run(&mut buffer) {
			Err(Error::Gpu(rectify_gpu::Error::NoDevice | rectify_gpu::Error::RequestDevice(_))) => {
				assert_eq!(gpu.last_device(), None);
			}
			result => {
				result.unwrap();
				assert!(gpu.last_device().is_some());
				assert!(buffer.iter().all(|&x| x == 0));
			}
		}
	}

	#[test]
	fn test_scalar_name() {
		let backend = ScalarBackend::new(ScalarForm::ThreeStep).unwrap();
		assert_eq!(Backend::<i16>::name(&backend), "scalar 3-step (i16)");
	}
}
