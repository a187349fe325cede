// Copyright 2025 Irreducible Inc.

use tracing::instrument;

use crate::{
	config::{load_kernel_source, GpuConfig},
	device::DeviceInfo,
	error::Error,
	scope::DeviceScope,
};

/// Outcome of a successful offload.
#[derive(Debug, Clone)]
pub struct GpuRun {
	pub device: DeviceInfo,
}

/// Runs ReLU over `i32` buffers on a compute device.
#[derive(Debug, Clone, Default)]
pub struct GpuBackend {
	config: GpuConfig,
}

impl GpuBackend {
	pub fn new(config: GpuConfig) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &GpuConfig {
		&self.config
	}

	/// Applies ReLU to `data` in place on the selected device.
	///
	/// The shape preconditions are validated before any device is touched. `data` is only
	/// written after the device result has been read back, so on error it keeps its input
	/// values. Every device handle is released before this returns.
	#[instrument(
		skip_all,
		fields(len = data.len(), workgroup_size = self.config.workgroup_size)
	)]
	pub fn run(&self, data: &mut [i32]) -> Result<GpuRun, Error> {
		let workgroup_size = self.config.workgroup_size;
		if workgroup_size == 0 {
			return Err(Error::ZeroWorkgroupSize);
		}
		if data.is_empty() {
			return Err(Error::EmptyBuffer);
		}
		if data.len() % workgroup_size as usize != 0 {
			return Err(Error::WorkSizeMismatch {
				len: data.len(),
				workgroup_size,
			});
		}

		let mut scope = DeviceScope::acquire()?;
		let source = load_kernel_source(&self.config.kernel_path)?;
		scope.compile(&source, workgroup_size)?;
		scope.upload(data)?;
		scope.execute()?;
		scope.read_back(data)?;

		Ok(GpuRun {
			device: scope.info().clone(),
		})
	}
}
