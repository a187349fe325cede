// Copyright 2025 Irreducible Inc.

//! ReLU offload to a GPU (or, failing that, a CPU-class device) through `wgpu`.
//!
//! A run follows a fixed protocol: pick a device, open it, load and compile the kernel source
//! from disk, upload the buffer, dispatch, read the result back. Every handle acquired on the way
//! lives in a [`DeviceScope`], which releases them in reverse acquisition order on every exit
//! path, including compilation failures.

mod backend;
mod config;
mod device;
mod error;
mod scope;

pub use backend::{GpuBackend, GpuRun};
pub use config::{
	default_kernel_path, load_kernel_source, GpuConfig, DEFAULT_WORKGROUP_SIZE, KERNEL_ENTRY_POINT,
	KERNEL_PATH_ENV,
};
pub use device::{select_device, DeviceCandidate, DeviceClass, DeviceInfo};
pub use error::Error;
pub use scope::DeviceScope;
