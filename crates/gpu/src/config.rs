// Copyright 2025 Irreducible Inc.

use std::path::{Path, PathBuf};

use rectify_utils::env::path_env_var;

use crate::error::Error;

/// Environment variable overriding [`GpuConfig::kernel_path`].
pub const KERNEL_PATH_ENV: &str = "RECTIFY_KERNEL_PATH";

/// Name of the compute entry point in the kernel source.
pub const KERNEL_ENTRY_POINT: &str = "relu_kernel";

pub const DEFAULT_WORKGROUP_SIZE: u32 = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuConfig {
	/// WGSL file holding [`KERNEL_ENTRY_POINT`], read at every run.
	pub kernel_path: PathBuf,
	/// Invocations per work group. The buffer length must be a multiple of it.
	pub workgroup_size: u32,
}

impl Default for GpuConfig {
	fn default() -> Self {
		Self {
			kernel_path: path_env_var(KERNEL_PATH_ENV).unwrap_or_else(default_kernel_path),
			workgroup_size: DEFAULT_WORKGROUP_SIZE,
		}
	}
}

/// The kernel shipped with this crate.
pub fn default_kernel_path() -> PathBuf {
	Path::new(env!("CARGO_MANIFEST_DIR")).join("kernels/relu.wgsl")
}

pub fn load_kernel_source(path: &Path) -> Result<String, Error> {
	std::fs::read_to_string(path).map_err(|source| Error::KernelSource {
		path: path.to_path_buf(),
		source,
	})
}
