//! Access token issued by a client-credentials exchange.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Access token returned by the token endpoint.
///
/// The value is opaque; only [`TokenSecret::fingerprint`] may reach logs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenResponse {
	/// Access token secret.
	pub access_token: TokenSecret,
	/// Token type reported by the provider (`Bearer` when omitted).
	pub token_type: String,
	/// Lifetime reported by the provider, if any.
	pub expires_in: Option<Duration>,
	/// Space-delimited scopes granted, if reported.
	pub scope: Option<String>,
	/// Instant the response was received.
	pub issued_at: OffsetDateTime,
}
impl TokenResponse {
	/// Expiry instant derived from `issued_at + expires_in`.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_in.and_then(|lifetime| self.issued_at.checked_add(lifetime))
	}

	pub(crate) fn from_wire(wire: TokenResponseWire, issued_at: OffsetDateTime) -> Option<Self> {
		let access_token = wire.access_token.filter(|token| !token.is_blank())?;
		let expires_in = wire
			.expires_in
			.filter(|secs| *secs > 0)
			.and_then(|secs| i64::try_from(secs).ok())
			.map(Duration::seconds);

		Some(Self {
			access_token,
			token_type: wire.token_type.unwrap_or_else(|| DEFAULT_TOKEN_TYPE.into()),
			expires_in,
			scope: wire.scope,
			issued_at,
		})
	}
}

/// Raw token endpoint payload; `access_token` presence is checked after parsing.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponseWire {
	#[serde(default)]
	access_token: Option<TokenSecret>,
	#[serde(default)]
	token_type: Option<String>,
	#[serde(default)]
	expires_in: Option<u64>,
	#[serde(default)]
	scope: Option<String>,
}

/// OAuth error fields that token endpoints attach to non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct OAuthErrorWire {
	#[serde(default)]
	pub error: Option<String>,
	#[serde(default)]
	pub error_description: Option<String>,
}
impl OAuthErrorWire {
	/// Prefers `error_description`, then `error`.
	pub(crate) fn reason(self) -> Option<String> {
		self.error_description.or(self.error).filter(|value| !value.trim().is_empty())
	}
}
