// Copyright 2025 Irreducible Inc.

use std::path::PathBuf;

use assert_matches::assert_matches;
use rectify_gpu::{Error, GpuBackend, GpuConfig, KERNEL_ENTRY_POINT};
use rectify_kernels::{AlignedBuffer, DispatchConfig, Dispatcher, PipelineKernel};

fn pattern(len: usize) -> Vec<i32> {
	(0..len).map(|i| ((i * i) % 2000) as i32 - 1000).collect()
}

fn write_kernel(name: &str, source: &str) -> PathBuf {
	let path = std::env::temp_dir().join(format!("rectify-{}-{name}.wgsl", std::process::id()));
	std::fs::write(&path, source).unwrap();
	path
}

/// Hosts without a usable adapter skip the device tests.
fn device_unavailable(err: &Error) -> bool {
	matches!(err, Error::NoDevice | Error::RequestDevice(_))
}

#[test]
fn test_gpu_matches_cpu_pipeline() {
	let values = pattern(1 << 16);

	let mut gpu = values.clone();
	match GpuBackend::default().run(&mut gpu) {
		Err(err) if device_unavailable(&err) => return,
		result => {
			result.unwrap();
		}
	}

	let mut cpu = AlignedBuffer::from_slice(&values).unwrap();
	Dispatcher::new(DispatchConfig::default())
		.unwrap()
		.run(&PipelineKernel::new(), &mut cpu)
		.unwrap();

	assert_eq!(gpu.as_slice(), &*cpu);
}

#[test]
fn test_gpu_scenario() {
	let input = [-5, -4, -3, -2, -1, 0, 1, 2, 3, 4, 5, -6, -7, 8, 9, -10];
	let mut data = input.to_vec();
	let backend = GpuBackend::new(GpuConfig {
		workgroup_size: 16,
		..GpuConfig::default()
	});
	match backend.run(&mut data) {
		Err(err) if device_unavailable(&err) => return,
		result => {
			result.unwrap();
		}
	}
	assert_eq!(data, [0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 0, 0, 8, 9, 0]);
}

#[test]
fn test_compile_failure_leaves_buffer_untouched() {
	let path = write_kernel(
		"broken",
		&format!("@compute @workgroup_size(WORKGROUP_SIZE)\nfn {KERNEL_ENTRY_POINT}() {{ let x = ; }}\n"),
	);
	let backend = GpuBackend::new(GpuConfig {
		kernel_path: path.clone(),
		workgroup_size: 64,
	});

	let values = pattern(256);
	let mut data = values.clone();
	let result = backend.run(&mut data);
	std::fs::remove_file(&path).unwrap();

	match result {
		Err(err) if device_unavailable(&err) => {}
		Err(Error::KernelCompilation { log }) => assert!(!log.is_empty()),
		other => panic!("expected a compilation failure, got {other:?}"),
	}
	assert_eq!(data, values);
}

#[test]
fn test_missing_kernel_source() {
	let backend = GpuBackend::new(GpuConfig {
		kernel_path: PathBuf::from("/nonexistent/relu.wgsl"),
		workgroup_size: 64,
	});
	let mut data = pattern(128);
	assert_matches!(
		backend.run(&mut data),
		Err(Error::NoDevice | Error::RequestDevice(_) | Error::KernelSource { .. })
	);
}

#[test]
fn test_work_size_must_divide_len() {
	let mut data = pattern(1000);
	assert_matches!(
		GpuBackend::default().run(&mut data),
		Err(Error::WorkSizeMismatch {
			len: 1000,
			workgroup_size: 128,
		})
	);
}
