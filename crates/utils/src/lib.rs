// Copyright 2024 Irreducible Inc.

pub mod env;
pub mod error_utils;
pub mod rayon;
pub mod tracing;

#[doc(hidden)]
pub use ::tracing as __tracing;
