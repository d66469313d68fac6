//! Secure secret wrapper that redacts sensitive material.

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Redacted secret wrapper for client secrets and access tokens.
///
/// Serializes as the bare string so it can sit inside request bodies, while `Debug` and
/// `Display` never print the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	const FINGERPRINT_LEN: usize = 12;

	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the wrapped value is empty or whitespace.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}

	/// Short SHA-256 hex prefix that identifies the secret in logs without revealing it.
	pub fn fingerprint(&self) -> String {
		let digest = Sha256::digest(self.0.as_bytes());
		let mut hex = String::with_capacity(Self::FINGERPRINT_LEN);

		for byte in digest.iter().take(Self::FINGERPRINT_LEN / 2) {
			hex.push_str(&format!("{byte:02x}"));
		}

		hex
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
