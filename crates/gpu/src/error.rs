// Copyright 2025 Irreducible Inc.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("no GPU- or CPU-class compute device is available on any platform")]
	NoDevice,
	#[error("failed to open the compute device: {0}")]
	RequestDevice(#[from] wgpu::RequestDeviceError),
	#[error("failed to read kernel source {}: {source}", path.display())]
	KernelSource {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("kernel compilation failed:\n{log}")]
	KernelCompilation { log: String },
	#[error("the work-group size must be positive")]
	ZeroWorkgroupSize,
	#[error("buffer length {len} is not a multiple of the work-group size {workgroup_size}")]
	WorkSizeMismatch { len: usize, workgroup_size: u32 },
	#[error("cannot offload an empty buffer")]
	EmptyBuffer,
	#[error("a buffer of {bytes} bytes exceeds the device limit of {limit} bytes")]
	BufferTooLarge { bytes: u64, limit: u64 },
	#[error("{workgroups} work groups exceed the device dispatch limit")]
	TooManyWorkgroups { workgroups: u64 },
	#[error("failed to map the readback buffer: {0}")]
	Readback(#[from] wgpu::BufferAsyncError),
	#[error("device error during execution: {0}")]
	Execution(String),
}
