// Copyright 2024-2025 Irreducible Inc.

//! Branchless ReLU kernels over fixed-width numeric buffers.
//!
//! The crate is organised bottom-up:
//! - [`element`] views every supported numeric type as an unsigned bit pattern of equal width;
//! - [`bit_trick`] implements the sign-mask ReLU in its fused (2-step) and portable (3-step)
//!   forms on top of those bit patterns;
//! - [`pipeline`] holds the 8-lane block kernels, backed by the [`arch`] specific
//!   implementations;
//! - [`dispatch`] partitions an [`AlignedBuffer`] into disjoint blocks and runs a block kernel on
//!   each of them across a worker pool.

pub mod arch;
pub mod bit_trick;
mod buffer;
mod capability;
pub mod dispatch;
pub mod element;
mod error;
pub mod pipeline;

pub use bit_trick::{apply_scalar, relu, BitTrickForm, ScalarForm, ThreeStep, TwoStep};
pub use buffer::{AlignedBuffer, BUFFER_ALIGNMENT};
pub use capability::{Capabilities, VectorIsa};
pub use dispatch::{DispatchConfig, Dispatcher};
pub use element::{ReluElement, SignBits};
pub use error::Error;
pub use pipeline::{BlockKernel, LaneElement, PipelineKernel, ScalarKernel, UnrolledKernel, LANES};
