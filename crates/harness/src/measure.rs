// Copyright 2025 Irreducible Inc.

use rectify_kernels::AlignedBuffer;
use rectify_utils::ensure;
use tracing::{debug, instrument};

use crate::{
	backend::Backend,
	error::Error,
	populate::{Pattern, PatternElement},
	stats::Statistic,
	timing::{time, TrialSample},
	validate::{compare, Verdict},
};

/// Samples of a multi-sample run and their summary.
#[derive(Debug, Clone)]
pub struct Measurement {
	pub samples: Vec<TrialSample>,
	pub statistic: Statistic,
}

/// Refills `buffer` with `pattern`, then times one run of `backend` over it. The refill is not
/// part of the sample.
pub fn measure_single<T, B>(
	backend: &B,
	pattern: Pattern,
	buffer: &mut AlignedBuffer<T>,
) -> Result<TrialSample, Error>
where
	T: PatternElement,
	B: Backend<T> + ?Sized,
{
	pattern.fill(buffer);
	let (result, sample) = time(|| backend.run(buffer));
	result?;
	Ok(sample)
}

/// Times `trials` runs of `backend`, refilling the buffer before each one.
#[instrument(skip_all, fields(backend = %backend.name(), len = buffer.len(), trials = trials))]
pub fn measure<T, B>(
	backend: &B,
	pattern: Pattern,
	buffer: &mut AlignedBuffer<T>,
	trials: usize,
) -> Result<Measurement, Error>
where
	T: PatternElement,
	B: Backend<T> + ?Sized,
{
	ensure!(trials > 0, Error::NoTrials);

	let samples = (0..trials)
		.map(|_| measure_single(backend, pattern, buffer))
		.collect::<Result<Vec<_>, _>>()?;
	let cycles: Vec<u64> = samples.iter().map(|sample| sample.cycles).collect();
	let statistic = Statistic::from_cycles(&cycles).ok_or(Error::NoTrials)?;
	debug!(mean = statistic.mean, stddev = statistic.stddev, "measurement complete");

	Ok(Measurement { samples, statistic })
}

/// Results of two backends timed on separate, identically populated buffers.
#[derive(Debug, Clone)]
pub struct Comparison<T> {
	pub left: TrialSample,
	pub right: TrialSample,
	pub verdict: Verdict<T>,
}

/// Runs `left` and `right` once each on their own buffer of `len` elements and compares the
/// outputs. A failure of either backend leaves the other one's buffer untouched.
pub fn cross_validate<T, L, R>(
	left: &L,
	right: &R,
	pattern: Pattern,
	len: usize,
) -> Result<Comparison<T>, Error>
where
	T: PatternElement,
	L: Backend<T> + ?Sized,
	R: Backend<T> + ?Sized,
{
	let mut left_buffer = AlignedBuffer::zeroed(len)?;
	let mut right_buffer = AlignedBuffer::zeroed(len)?;

	let left_sample = measure_single(left, pattern, &mut left_buffer)?;
	let right_sample = measure_single(right, pattern, &mut right_buffer)?;
	let verdict = compare(&left_buffer, &right_buffer)?;

	Ok(Comparison {
		left: left_sample,
		right: right_sample,
		verdict,
	})
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;
	use rectify_kernels::ScalarForm;

	use super::*;
	use crate::backend::ScalarBackend;

	/// Flips one element after a correct pass.
	struct Faulty(usize);

	impl Backend<i32> for Faulty {
		fn name(&self) -> String {
			"faulty".to_string()
		}

		fn run(&self, buffer: &mut AlignedBuffer<i32>) -> Result<(), Error> {
			ScalarForm::ThreeStep.apply_slice(buffer.as_mut_slice());
			buffer[self.0] = -1;
			Ok(())
		}
	}

	#[test]
	fn test_zero_trials() {
		let backend = ScalarBackend::new(ScalarForm::ThreeStep).unwrap();
		let mut buffer = AlignedBuffer::<i32>::zeroed(64).unwrap();
		assert_matches!(
			measure(&backend, Pattern::default(), &mut buffer, 0),
			Err(Error::NoTrials)
		);
	}

	#[test]
	fn test_measure_collects_every_trial() {
		let backend = ScalarBackend::new(ScalarForm::ThreeStep).unwrap();
		let mut buffer = AlignedBuffer::<i64>::zeroed(1024).unwrap();
		let measurement = measure(&backend, Pattern::default(), &mut buffer, 5).unwrap();
		assert_eq!(measurement.samples.len(), 5);
		assert_eq!(measurement.statistic.trials, 5);
		assert!(buffer.iter().all(|&x| x >= 0));
	}

	#[test]
	fn test_cross_validate_stops_at_first_mismatch() {
		let scalar = ScalarBackend::new(ScalarForm::ThreeStep).unwrap();
		let comparison = cross_validate(&scalar, &Faulty(45), Pattern::default(), 256).unwrap();
		assert_eq!(
			comparison.verdict,
			Verdict::Mismatch(crate::validate::Mismatch {
				index: 45,
				left: 0,
				right: -1,
			})
		);
	}
}
