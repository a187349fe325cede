// Copyright 2024-2025 Irreducible Inc.

use std::sync::OnceLock;

use cfg_if::cfg_if;

use crate::{bit_trick::ScalarForm, error::Error};

/// Instruction-set extension the vector kernels run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorIsa {
	/// 256-bit AVX2 registers, 8 × 32-bit lanes.
	Avx2,
	/// Plain Rust over 8-element arrays; available everywhere.
	Portable,
}

impl VectorIsa {
	pub const fn name(self) -> &'static str {
		match self {
			Self::Avx2 => "avx2",
			Self::Portable => "portable",
		}
	}
}

/// Deployment-target capabilities the kernels depend on.
///
/// These describe the CPU and never the data, so they are detected once at startup and checked
/// when a kernel is configured, not inside the element loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
	/// A fused and-not instruction (`andn` from BMI1, or `bic` on aarch64).
	pub fused_and_not: bool,
	pub avx2: bool,
}

impl Capabilities {
	/// Capabilities of the host CPU, detected on first use.
	pub fn detect() -> &'static Self {
		static DETECTED: OnceLock<Capabilities> = OnceLock::new();

		DETECTED.get_or_init(|| {
			let capabilities = Self::detect_host();
			tracing::debug!(
				fused_and_not = capabilities.fused_and_not,
				avx2 = capabilities.avx2,
				"detected CPU capabilities"
			);
			capabilities
		})
	}

	fn detect_host() -> Self {
		cfg_if! {
			if #[cfg(target_arch = "x86_64")] {
				Self {
					fused_and_not: std::arch::is_x86_feature_detected!("bmi1"),
					avx2: std::arch::is_x86_feature_detected!("avx2"),
				}
			} else if #[cfg(target_arch = "aarch64")] {
				Self {
					fused_and_not: true,
					avx2: false,
				}
			} else {
				Self {
					fused_and_not: false,
					avx2: false,
				}
			}
		}
	}

	/// The widest vector ISA available.
	pub fn best_vector_isa(&self) -> VectorIsa {
		if self.avx2 {
			VectorIsa::Avx2
		} else {
			VectorIsa::Portable
		}
	}

	pub fn supports_isa(&self, isa: VectorIsa) -> bool {
		match isa {
			VectorIsa::Avx2 => self.avx2,
			VectorIsa::Portable => true,
		}
	}

	pub fn require_isa(&self, isa: VectorIsa, required_by: &'static str) -> Result<(), Error> {
		if !self.supports_isa(isa) {
			return Err(Error::UnsupportedCapability {
				capability: isa.name(),
				required_by,
			});
		}
		Ok(())
	}

	/// Fails if `form` needs a fused and-not instruction the CPU does not offer.
	pub fn require_form(&self, form: ScalarForm) -> Result<(), Error> {
		if form.requires_fused_and_not() && !self.fused_and_not {
			return Err(Error::UnsupportedCapability {
				capability: "and-not (bmi1)",
				required_by: form.name(),
			});
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;

	use super::*;

	#[test]
	fn test_portable_is_always_supported() {
		let none = Capabilities {
			fused_and_not: false,
			avx2: false,
		};
		assert!(none.supports_isa(VectorIsa::Portable));
		assert_eq!(none.best_vector_isa(), VectorIsa::Portable);
		assert!(none.require_form(ScalarForm::ThreeStep).is_ok());
	}

	#[test]
	fn test_missing_capabilities_are_reported() {
		let none = Capabilities {
			fused_and_not: false,
			avx2: false,
		};
		assert_matches!(
			none.require_form(ScalarForm::TwoStep),
			Err(Error::UnsupportedCapability {
				required_by: "2-step",
				..
			})
		);
		assert_matches!(
			none.require_isa(VectorIsa::Avx2, "pipeline"),
			Err(Error::UnsupportedCapability {
				capability: "avx2",
				..
			})
		);
	}

	#[test]
	fn test_detect_is_stable() {
		assert_eq!(Capabilities::detect(), Capabilities::detect());
	}
}
