// Copyright 2025 Irreducible Inc.

use std::time::{Duration, Instant};

use cfg_if::cfg_if;

cfg_if! {
	if #[cfg(target_arch = "x86_64")] {
		/// Reads the time-stamp counter.
		#[inline(always)]
		pub fn read_cycle_counter() -> u64 {
			// SAFETY: `rdtsc` is available on every x86_64 CPU.
			unsafe { std::arch::x86_64::_rdtsc() }
		}
	} else {
		use std::sync::OnceLock;

		/// Without a time-stamp counter, nanoseconds since the first read stand in for cycles.
		#[inline(always)]
		pub fn read_cycle_counter() -> u64 {
			static EPOCH: OnceLock<Instant> = OnceLock::new();
			EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
		}
	}
}

/// One measured execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialSample {
	pub cycles: u64,
	pub elapsed: Duration,
}

impl TrialSample {
	pub fn elapsed_micros(&self) -> f64 {
		self.elapsed.as_secs_f64() * 1e6
	}
}

/// Runs `f` between two wall-clock reads and, inside those, two cycle-counter reads.
#[inline]
pub fn time<R>(f: impl FnOnce() -> R) -> (R, TrialSample) {
	let start = Instant::now();
	let cycles_start = read_cycle_counter();
	let result = f();
	let cycles_end = read_cycle_counter();
	let elapsed = start.elapsed();

	let sample = TrialSample {
		cycles: cycles_end.wrapping_sub(cycles_start),
		elapsed,
	};
	(result, sample)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_time_returns_result_and_advances() {
		let (value, sample) = time(|| {
			std::thread::sleep(Duration::from_millis(2));
			7
		});
		assert_eq!(value, 7);
		assert!(sample.elapsed >= Duration::from_millis(2));
		assert!(sample.cycles > 0);
		assert!(sample.elapsed_micros() >= 2000.0);
	}
}
