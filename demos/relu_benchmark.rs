// Copyright 2025 Irreducible Inc.

//! Times the ReLU backends and checks that they agree.
//!
//! Runs, in order: a multi-sample measurement of the selected block kernel on the quadratic
//! pattern with the regression checksum, single-sample runs of both scalar forms, and a combined
//! CPU and GPU run on the linear pattern. The last line is the cross-backend verdict.

use std::path::PathBuf;

use anyhow::{bail, Result};
use bytesize::ByteSize;
use clap::{Parser, ValueEnum};
use rectify_gpu::{GpuBackend, GpuConfig};
use rectify_harness::{
	checksum, compare, cross_validate, measure, measure_single, report, Backend, DispatchBackend,
	GpuOffload, HarnessConfig, Pattern, ScalarBackend, Verdict, CHECKSUM_LEN, DEFAULT_LEN,
	DEFAULT_TRIALS, EXPECTED_CHECKSUM,
};
use rectify_kernels::{
	AlignedBuffer, Capabilities, DispatchConfig, Dispatcher, PipelineKernel, ScalarForm,
	UnrolledKernel,
};
use rectify_utils::{
	env::boolean_env_flag_set,
	rayon::{adjust_thread_pool, global_worker_count},
	tracing::init_tracing,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KernelArg {
	Pipeline,
	Unrolled,
}

#[derive(Debug, Parser)]
struct Args {
	/// Elements per buffer in the multi-sample run.
	#[arg(long, default_value_t = DEFAULT_LEN)]
	len: usize,
	/// Timed trials in the multi-sample run.
	#[arg(short, long, default_value_t = DEFAULT_TRIALS)]
	trials: usize,
	/// Block kernel run by the dispatcher.
	#[arg(long, value_enum, default_value_t = KernelArg::Pipeline)]
	kernel: KernelArg,
	/// Elements per dispatched block.
	#[arg(long, default_value_t = DispatchConfig::default().block_size)]
	block_size: usize,
	/// Size of a dedicated worker pool. Defaults to the global pool.
	#[arg(long)]
	threads: Option<usize>,
	/// Elements of the combined CPU and GPU run.
	#[arg(long, default_value_t = 1 << 24)]
	combined_len: usize,
	/// Invocations per GPU work group.
	#[arg(long, default_value_t = rectify_gpu::DEFAULT_WORKGROUP_SIZE)]
	workgroup_size: u32,
	/// Kernel source of the GPU backend.
	#[arg(long)]
	kernel_path: Option<PathBuf>,
	/// Skip the GPU backend. Also set by `RECTIFY_SKIP_GPU`.
	#[arg(long)]
	skip_gpu: bool,
	/// Print a line for every trial of the multi-sample run.
	#[arg(long)]
	print_samples: bool,
}

fn block_backend(kernel: KernelArg, dispatcher: Dispatcher) -> Box<dyn Backend<i32>> {
	match kernel {
		KernelArg::Pipeline => Box::new(DispatchBackend::new(dispatcher, PipelineKernel::new())),
		KernelArg::Unrolled => Box::new(DispatchBackend::new(dispatcher, UnrolledKernel::new())),
	}
}

/// Multi-sample run of the block kernel; returns whether the checksum matched, if it applies.
fn run_multi_sample(
	backend: &dyn Backend<i32>,
	config: &HarnessConfig,
	print_samples: bool,
) -> Result<Option<bool>> {
	let name = backend.name();
	let mut buffer = AlignedBuffer::<i32>::zeroed(config.len)?;
	println!(
		"{name}: {} elements ({}), {} trials",
		config.len,
		ByteSize::b(std::mem::size_of_val(buffer.as_slice()) as u64),
		config.trials
	);

	let measurement = measure(backend, config.pattern, &mut buffer, config.trials)?;
	if print_samples {
		for sample in &measurement.samples {
			println!("{}", report::sample_line(&name, sample));
		}
	}
	for line in report::statistic_lines(&name, &measurement.statistic) {
		println!("{line}");
	}

	if config.len != CHECKSUM_LEN || config.pattern != Pattern::QUADRATIC {
		return Ok(None);
	}
	let sum = checksum(&buffer);
	println!("{}", report::checksum_line(sum, EXPECTED_CHECKSUM));
	Ok(Some(sum == EXPECTED_CHECKSUM))
}

/// Single-sample runs of the scalar forms, each compared against the block kernel.
fn run_scalar_forms(block: &dyn Backend<i32>, len: usize) -> Result<Vec<Verdict<i32>>> {
	let mut verdicts = Vec::new();
	for form in [ScalarForm::ThreeStep, ScalarForm::TwoStep] {
		let scalar = match ScalarBackend::new(form) {
			Ok(scalar) => scalar,
			Err(err) => {
				println!("{}: skipped ({err})", form.name());
				continue;
			}
		};
		let name = Backend::<i32>::name(&scalar);
		let comparison = cross_validate(&scalar, block, Pattern::QUADRATIC, len)?;
		println!("{}", report::sample_line(&name, &comparison.left));
		println!("{}", report::verdict_line(&name, &block.name(), &comparison.verdict));
		verdicts.push(comparison.verdict);
	}
	Ok(verdicts)
}

/// Single-sample CPU and GPU runs on separate buffers. A GPU failure is reported and yields
/// `None`; the CPU result is still printed.
fn run_combined(
	cpu: &dyn Backend<i32>,
	gpu: Option<&GpuOffload>,
	len: usize,
) -> Result<Option<Verdict<i32>>> {
	let mut cpu_buffer = AlignedBuffer::<i32>::zeroed(len)?;
	let cpu_sample = measure_single(cpu, Pattern::LINEAR, &mut cpu_buffer)?;
	println!("{}", report::sample_line("CPU", &cpu_sample));

	let Some(gpu) = gpu else {
		println!("GPU: skipped");
		return Ok(None);
	};

	let mut gpu_buffer = AlignedBuffer::<i32>::zeroed(len)?;
	let gpu_sample = match measure_single(gpu, Pattern::LINEAR, &mut gpu_buffer) {
		Ok(sample) => sample,
		Err(err) => {
			tracing::warn!(%err, "GPU path aborted");
			println!("GPU path aborted: {err}");
			return Ok(None);
		}
	};
	if let Some(device) = gpu.last_device() {
		println!("GPU device: {device}");
	}
	println!("{}", report::sample_line("GPU", &gpu_sample));

	println!("{}: {} cycles", cpu.name(), cpu_sample.cycles);
	println!("{}: {} cycles", gpu.name(), gpu_sample.cycles);
	let verdict = compare(&cpu_buffer, &gpu_buffer)?;
	println!("{}", report::verdict_line("CPU", "GPU", &verdict));
	Ok(Some(verdict))
}

fn main() -> Result<()> {
	adjust_thread_pool()
		.as_ref()
		.expect("failed to init thread pool");

	let args = Args::parse();

	init_tracing();

	let capabilities = Capabilities::detect();
	tracing::info!(
		fused_and_not = capabilities.fused_and_not,
		avx2 = capabilities.avx2,
		global_workers = global_worker_count(),
		"detected CPU capabilities"
	);

	let dispatcher = Dispatcher::new(DispatchConfig {
		block_size: args.block_size,
		num_threads: args.threads,
	})?;
	let block = block_backend(args.kernel, dispatcher);

	let config = HarnessConfig {
		len: args.len,
		trials: args.trials,
		pattern: Pattern::QUADRATIC,
	};
	let checksum_ok = run_multi_sample(block.as_ref(), &config, args.print_samples)?;
	let scalar_verdicts = run_scalar_forms(block.as_ref(), config.len)?;

	let gpu = (!args.skip_gpu && !boolean_env_flag_set("RECTIFY_SKIP_GPU")).then(|| {
		let defaults = GpuConfig::default();
		GpuOffload::new(GpuBackend::new(GpuConfig {
			kernel_path: args.kernel_path.clone().unwrap_or(defaults.kernel_path),
			workgroup_size: args.workgroup_size,
		}))
	});
	let gpu_verdict = run_combined(block.as_ref(), gpu.as_ref(), args.combined_len)?;

	let all_equal = scalar_verdicts
		.iter()
		.chain(gpu_verdict.as_ref())
		.all(Verdict::is_equal);
	let agree = all_equal && checksum_ok != Some(false);
	println!(
		"Cross-backend verdict: {}",
		if agree { "all backends agree" } else { "MISMATCH" }
	);

	if !agree {
		bail!("backends disagree");
	}
	Ok(())
}
