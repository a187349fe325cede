// Copyright 2024-2025 Irreducible Inc.

//! Early-return helpers for functions returning `Result`.
//!
//! With the `bail_panic` feature the macros panic instead of returning, so that a failing check
//! leaves a backtrace at the point of failure.

#[cfg(feature = "bail_panic")]
#[macro_export]
macro_rules! bail {
	($err:expr) => {
		panic!("{}", $err);
	};
}

/// Returns `Err($err.into())`, recording the error as a debug event first.
#[cfg(not(feature = "bail_panic"))]
#[macro_export]
macro_rules! bail {
	($err:expr) => {{
		let err = $err;
		$crate::__tracing::debug!(error = %err, "check failed");
		return Err(err.into());
	}};
}

#[macro_export]
macro_rules! ensure {
	($cond:expr, $err:expr) => {
		if !$cond {
			$crate::bail!($err);
		}
	};
}
