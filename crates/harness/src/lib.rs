// Copyright 2025 Irreducible Inc.

//! Timing and cross-validation of the ReLU backends.
//!
//! A run populates an aligned buffer from a [`Pattern`], hands it to a [`Backend`] that rewrites
//! it in place, and wraps the call in cycle-counter and wall-clock reads. Multi-sample runs refill
//! the buffer before every trial and summarise the cycle counts as a [`Statistic`]. Outputs of
//! different backends are compared element by element, or summed and checked against
//! [`EXPECTED_CHECKSUM`].

mod backend;
mod config;
mod error;
mod measure;
mod populate;
pub mod report;
mod stats;
mod timing;
mod validate;

pub use backend::{Backend, DispatchBackend, GpuOffload, ScalarBackend};
pub use config::{HarnessConfig, DEFAULT_LEN, DEFAULT_TRIALS};
pub use error::Error;
pub use measure::{cross_validate, measure, measure_single, Comparison, Measurement};
pub use populate::{Pattern, PatternElement};
pub use stats::Statistic;
pub use timing::{read_cycle_counter, time, TrialSample};
pub use validate::{checksum, compare, Mismatch, Verdict, CHECKSUM_LEN, EXPECTED_CHECKSUM};
