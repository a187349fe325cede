// Copyright 2025 Irreducible Inc.

use rectify_gpu::{Error as GpuError, GpuBackend};
use rectify_harness::{
	checksum, cross_validate, measure, measure_single, Backend, DispatchBackend, Error, GpuOffload,
	Pattern, ScalarBackend, Verdict, CHECKSUM_LEN, EXPECTED_CHECKSUM,
};
use rectify_kernels::{
	AlignedBuffer, Capabilities, DispatchConfig, Dispatcher, PipelineKernel, ScalarForm,
	UnrolledKernel,
};

fn pipeline(block_size: usize) -> DispatchBackend<PipelineKernel> {
	DispatchBackend::new(
		Dispatcher::new(DispatchConfig {
			block_size,
			num_threads: None,
		})
		.unwrap(),
		PipelineKernel::new(),
	)
}

fn checksum_after<B: Backend<i32>>(backend: &B, len: usize) -> i64 {
	let mut buffer = AlignedBuffer::zeroed(len).unwrap();
	measure_single(backend, Pattern::default(), &mut buffer).unwrap();
	checksum(&buffer)
}

#[test]
fn test_regression_checksum_pipeline() {
	assert_eq!(checksum_after(&pipeline(256), CHECKSUM_LEN), EXPECTED_CHECKSUM);
}

#[test]
fn test_regression_checksum_unrolled() {
	let unrolled = DispatchBackend::new(
		Dispatcher::new(DispatchConfig {
			block_size: 1024,
			num_threads: Some(4),
		})
		.unwrap(),
		UnrolledKernel::new(),
	);
	assert_eq!(checksum_after(&unrolled, CHECKSUM_LEN), EXPECTED_CHECKSUM);
}

#[test]
fn test_regression_checksum_scalar_forms() {
	let three = ScalarBackend::new(ScalarForm::ThreeStep).unwrap();
	assert_eq!(checksum_after(&three, CHECKSUM_LEN), EXPECTED_CHECKSUM);
	assert_eq!(checksum_after(&three, 1024), 218_266);
	assert_eq!(checksum_after(&three, 4096), 889_703);

	if Capabilities::detect().fused_and_not {
		let two = ScalarBackend::new(ScalarForm::TwoStep).unwrap();
		assert_eq!(checksum_after(&two, CHECKSUM_LEN), EXPECTED_CHECKSUM);
	}
}

#[test]
fn test_checksum_is_stable_across_trials() {
	let backend = pipeline(512);
	let mut buffer = AlignedBuffer::<i32>::zeroed(CHECKSUM_LEN).unwrap();
	let measurement = measure(&backend, Pattern::default(), &mut buffer, 3).unwrap();
	assert_eq!(measurement.samples.len(), 3);
	assert!(measurement.statistic.stddev >= 0.0);
	assert_eq!(checksum(&buffer), EXPECTED_CHECKSUM);
}

#[test]
fn test_block_sizes_agree() {
	let comparison =
		cross_validate::<i32, _, _>(&pipeline(8), &pipeline(4096), Pattern::default(), 100_003)
			.unwrap();
	assert_eq!(comparison.verdict, Verdict::Equal);
}

#[test]
fn test_cpu_and_gpu_agree_on_linear_pattern() {
	let gpu = GpuOffload::new(GpuBackend::default());
	match cross_validate(&pipeline(256), &gpu, Pattern::LINEAR, 1 << 20) {
		Err(Error::Gpu(GpuError::NoDevice | GpuError::RequestDevice(_))) => {}
		result => assert_eq!(result.unwrap().verdict, Verdict::Equal),
	}
}
