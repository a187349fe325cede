// Copyright 2024 Irreducible Inc.

use std::path::PathBuf;

/// Read boolean flag from the environment variable.
pub fn boolean_env_flag_set(flag: &str) -> bool {
	match std::env::var(flag) {
		Ok(val) => ["1", "on", "ON", "true", "TRUE", "yes", "YES"].contains(&val.as_str()),
		Err(_) => false,
	}
}

/// Read a filesystem path from the environment variable, ignoring empty values.
pub fn path_env_var(var: &str) -> Option<PathBuf> {
	match std::env::var_os(var) {
		Some(val) if !val.is_empty() => Some(PathBuf::from(val)),
		_ => None,
	}
}
