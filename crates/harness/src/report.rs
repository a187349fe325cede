// Copyright 2025 Irreducible Inc.

//! Lines printed to standard output by the benchmark binaries.

use std::fmt::Debug;

use crate::{stats::Statistic, timing::TrialSample, validate::Verdict};

pub fn sample_line(label: &str, sample: &TrialSample) -> String {
	format!("{label}: {:.3} us, {} cycles", sample.elapsed_micros(), sample.cycles)
}

pub fn statistic_lines(label: &str, statistic: &Statistic) -> [String; 2] {
	[
		format!("{label}: {:.0} cycles (mean)", statistic.mean),
		format!("{label}: {:.3} cycles (stddev)", statistic.stddev),
	]
}

pub fn checksum_line(checksum: i64, expected: i64) -> String {
	let verdict = if checksum == expected { "MATCH" } else { "MISMATCH" };
	format!("checksum: {checksum} (expected {expected}) {verdict}")
}

pub fn verdict_line<T: Debug>(left: &str, right: &str, verdict: &Verdict<T>) -> String {
	format!("{left} vs {right}: {verdict}")
}
