// Copyright 2025 Irreducible Inc.

use criterion::{
	criterion_group, criterion_main, measurement::WallTime, BenchmarkGroup, Criterion, Throughput,
};
use rand::{thread_rng, Rng};
use rectify_kernels::{
	relu, AlignedBuffer, BitTrickForm, BlockKernel, DispatchConfig, Dispatcher, PipelineKernel,
	ReluElement, ScalarKernel, ThreeStep, TwoStep, UnrolledKernel,
};

const LEN: usize = 1 << 19;

fn random_buffer() -> AlignedBuffer<i32> {
	let mut rng = thread_rng();
	let values: Vec<i32> = (0..LEN).map(|_| rng.gen_range(-1000..1000)).collect();
	AlignedBuffer::from_slice(&values).unwrap()
}

fn bench_scalar_forms(c: &mut Criterion) {
	let mut group = c.benchmark_group("scalar");

	fn bench_form<F: BitTrickForm, T: ReluElement>(
		group: &mut BenchmarkGroup<WallTime>,
		values: &[T],
	) {
		group.throughput(Throughput::Elements(values.len() as u64));
		group.bench_function(format!("{}/{}", F::NAME, T::NAME), |bench| {
			bench.iter(|| values.iter().map(|&x| relu::<F, T>(x)).fold(T::ZERO, |_, y| y))
		});
	}

	let mut rng = thread_rng();
	let ints: Vec<i64> = (0..4096).map(|_| rng.gen()).collect();
	let floats: Vec<f32> = (0..4096).map(|_| rng.gen_range(-1.0..1.0)).collect();

	bench_form::<TwoStep, i64>(&mut group, &ints);
	bench_form::<ThreeStep, i64>(&mut group, &ints);
	bench_form::<TwoStep, f32>(&mut group, &floats);
	bench_form::<ThreeStep, f32>(&mut group, &floats);

	group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
	let mut group = c.benchmark_group("dispatch");
	group.throughput(Throughput::Elements(LEN as u64));

	fn bench_kernel<K: BlockKernel<i32>>(
		group: &mut BenchmarkGroup<WallTime>,
		kernel: &K,
		block_size: usize,
	) {
		let dispatcher = Dispatcher::new(DispatchConfig {
			block_size,
			num_threads: None,
		})
		.unwrap();
		let mut buffer = random_buffer();
		group.bench_function(format!("{}/block_{block_size}", kernel.name()), |bench| {
			bench.iter(|| dispatcher.run(kernel, &mut buffer).unwrap())
		});
	}

	for block_size in [256, 4096, 65536] {
		bench_kernel(&mut group, &PipelineKernel::new(), block_size);
		bench_kernel(&mut group, &UnrolledKernel::new(), block_size);
	}
	if let Ok(kernel) = ScalarKernel::<TwoStep>::new() {
		bench_kernel(&mut group, &kernel, 4096);
	}
	bench_kernel(&mut group, &ScalarKernel::<ThreeStep>::new().unwrap(), 4096);

	group.finish();
}

criterion_group!(relu_kernels, bench_scalar_forms, bench_dispatch);
criterion_main!(relu_kernels);
