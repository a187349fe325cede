// Copyright 2025 Irreducible Inc.

//! Spot checks of both scalar forms on one negative value of every element width.

use std::fmt::Display;

use anyhow::{bail, Result};
use rectify_kernels::{relu, BitTrickForm, Capabilities, ReluElement, ThreeStep, TwoStep};
use rectify_utils::tracing::init_tracing;

fn expect<F: BitTrickForm, T: ReluElement + PartialOrd + Display>(x: T) -> bool {
	let expected = if x >= T::ZERO { x } else { T::ZERO };
	let got = relu::<F, T>(x);
	let pass = got.bits_eq(expected);
	println!(
		"{}: {} {}: expected {expected}, got {got}",
		if pass { "PASS" } else { "FAIL" },
		F::NAME,
		T::NAME
	);
	pass
}

fn check_form<F: BitTrickForm>() -> bool {
	println!("\nTesting {} form:", F::NAME);
	[
		expect::<F, _>(-5i8),
		expect::<F, _>(-12345i16),
		expect::<F, _>(-123456789i32),
		expect::<F, _>(-9876543210i64),
		expect::<F, _>(-3.25f32),
		expect::<F, _>(-2.75f64),
		expect::<F, _>(42i32),
		expect::<F, _>(0.5f64),
	]
	.into_iter()
	.all(|pass| pass)
}

fn main() -> Result<()> {
	init_tracing();

	let capabilities = Capabilities::detect();
	println!("fused and-not: {}, avx2: {}", capabilities.fused_and_not, capabilities.avx2);

	let mut all_pass = check_form::<ThreeStep>();
	if capabilities.fused_and_not {
		all_pass &= check_form::<TwoStep>();
	} else {
		println!("\nSKIP: {} form needs a fused and-not instruction", TwoStep::NAME);
	}

	if !all_pass {
		bail!("scalar spot checks failed");
	}
	Ok(())
}
