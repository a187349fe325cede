// Copyright 2025 Irreducible Inc.

use std::fmt;

/// Mean and population standard deviation of the cycle counts of a set of trials.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistic {
	pub trials: usize,
	pub mean: f64,
	pub stddev: f64,
}

impl Statistic {
	/// Returns `None` for an empty set of samples.
	pub fn from_cycles(cycles: &[u64]) -> Option<Self> {
		if cycles.is_empty() {
			return None;
		}

		let n = cycles.len() as f64;
		let mean = cycles.iter().map(|&c| c as f64).sum::<f64>() / n;
		let variance = cycles
			.iter()
			.map(|&c| {
				let diff = c as f64 - mean;
				diff * diff
			})
			.sum::<f64>()
			/ n;

		Some(Self {
			trials: cycles.len(),
			mean,
			stddev: variance.sqrt(),
		})
	}
}

impl fmt::Display for Statistic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{:.0} cycles (mean), {:.3} cycles (stddev) over {} trials",
			self.mean, self.stddev, self.trials
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_empty() {
		assert_eq!(Statistic::from_cycles(&[]), None);
	}

	#[test]
	fn test_single_sample_has_no_spread() {
		let stat = Statistic::from_cycles(&[1234]).unwrap();
		assert_eq!(stat.trials, 1);
		assert_eq!(stat.mean, 1234.0);
		assert_eq!(stat.stddev, 0.0);
	}

	#[test]
	fn test_population_stddev() {
		let stat = Statistic::from_cycles(&[2, 4, 4, 4, 5, 5, 7, 9]).unwrap();
		assert_eq!(stat.mean, 5.0);
		assert_eq!(stat.stddev, 2.0);
	}

	#[test]
	fn test_display() {
		let stat = Statistic::from_cycles(&[10, 20]).unwrap();
		assert_eq!(stat.to_string(), "15 cycles (mean), 5.000 cycles (stddev) over 2 trials");
	}
}
