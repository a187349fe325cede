// Copyright 2025 Irreducible Inc.

use std::fmt;

use itertools::Itertools;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
	Gpu,
	Cpu,
	Other,
}

impl From<wgpu::DeviceType> for DeviceClass {
	fn from(device_type: wgpu::DeviceType) -> Self {
		match device_type {
			wgpu::DeviceType::DiscreteGpu
			| wgpu::DeviceType::IntegratedGpu
			| wgpu::DeviceType::VirtualGpu => Self::Gpu,
			wgpu::DeviceType::Cpu => Self::Cpu,
			wgpu::DeviceType::Other => Self::Other,
		}
	}
}

/// One enumerated adapter. The platform is the graphics API backend exposing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCandidate {
	pub platform: wgpu::Backend,
	pub class: DeviceClass,
	pub name: String,
}

impl From<&wgpu::AdapterInfo> for DeviceCandidate {
	fn from(info: &wgpu::AdapterInfo) -> Self {
		Self {
			platform: info.backend,
			class: info.device_type.into(),
			name: info.name.clone(),
		}
	}
}

/// Picks the device a run will use, returning its index in `candidates`.
///
/// Platforms are visited in the order they first appear. On each platform a GPU-class device is
/// preferred, then a CPU-class one; the first platform offering either wins. Devices are not
/// ranked by performance.
pub fn select_device(candidates: &[DeviceCandidate]) -> Option<usize> {
	let platforms = candidates.iter().map(|candidate| candidate.platform).unique();

	for platform in platforms {
		for class in [DeviceClass::Gpu, DeviceClass::Cpu] {
			let found = candidates
				.iter()
				.position(|candidate| candidate.platform == platform && candidate.class == class);
			if found.is_some() {
				return found;
			}
		}
	}
	None
}

/// Description of the device a run executed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
	pub name: String,
	pub class: DeviceClass,
	pub platform: wgpu::Backend,
}

impl From<DeviceCandidate> for DeviceInfo {
	fn from(candidate: DeviceCandidate) -> Self {
		Self {
			name: candidate.name,
			class: candidate.class,
			platform: candidate.platform,
		}
	}
}

impl fmt::Display for DeviceInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} ({:?} device on {:?})", self.name, self.class, self.platform)
	}
}

#[cfg(test)]
mod tests {
	use wgpu::Backend;

	use super::*;

	fn candidate(platform: Backend, class: DeviceClass, name: &str) -> DeviceCandidate {
		DeviceCandidate {
			platform,
			class,
			name: name.to_string(),
		}
	}

	#[test]
	fn test_empty_enumeration() {
		assert_eq!(select_device(&[]), None);
	}

	#[test]
	fn test_gpu_preferred_on_same_platform() {
		let candidates = [
			candidate(Backend::Vulkan, DeviceClass::Cpu, "llvmpipe"),
			candidate(Backend::Vulkan, DeviceClass::Gpu, "discrete"),
		];
		assert_eq!(select_device(&candidates), Some(1));
	}

	#[test]
	fn test_cpu_fallback_on_first_platform_wins() {
		let candidates = [
			candidate(Backend::Vulkan, DeviceClass::Cpu, "llvmpipe"),
			candidate(Backend::Gl, DeviceClass::Gpu, "gl gpu"),
		];
		assert_eq!(select_device(&candidates), Some(0));
	}

	#[test]
	fn test_platform_without_usable_device_is_skipped() {
		let candidates = [
			candidate(Backend::Vulkan, DeviceClass::Other, "unknown"),
			candidate(Backend::Gl, DeviceClass::Cpu, "software"),
			candidate(Backend::Gl, DeviceClass::Gpu, "gl gpu"),
		];
		assert_eq!(select_device(&candidates), Some(2));
	}

	#[test]
	fn test_only_other_devices() {
		let candidates = [candidate(Backend::Vulkan, DeviceClass::Other, "unknown")];
		assert_eq!(select_device(&candidates), None);
	}

	#[test]
	fn test_device_type_classes() {
		assert_eq!(DeviceClass::from(wgpu::DeviceType::IntegratedGpu), DeviceClass::Gpu);
		assert_eq!(DeviceClass::from(wgpu::DeviceType::Cpu), DeviceClass::Cpu);
		assert_eq!(DeviceClass::from(wgpu::DeviceType::Other), DeviceClass::Other);
	}
}
