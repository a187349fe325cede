// Copyright 2024-2025 Irreducible Inc.

//! Architecture specific bodies of the 8-lane block kernels.
//!
//! Each module exposes the same two kernels over `i32` lanes: the software-pipelined loop and
//! the fully unrolled 128-element block. Selection between them happens once, when a
//! [`crate::PipelineKernel`] or [`crate::UnrolledKernel`] is constructed.

use cfg_if::cfg_if;

pub mod portable;

cfg_if! {
	if #[cfg(target_arch = "x86_64")] {
		pub mod x86_64;
	}
}
