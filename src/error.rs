//! Rotation error types shared across the exchanger, publisher, and orchestrator.
//!
//! No variant ever stores a client secret, an access token, or a bearer token. Reason
//! strings lifted from upstream responses are scrubbed with [`scrub`] before they are
//! attached.

// self
use crate::{_prelude::*, auth::ApiSlot, obs::RotationStage};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

const REDACTED: &str = "<redacted>";
const PREVIEW_LIMIT: usize = 256;

/// Canonical rotation error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Required configuration is missing, malformed, or unresolvable.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The token endpoint refused or garbled a client-credentials exchange.
	#[error(transparent)]
	AuthExchange(#[from] AuthExchangeError),
	/// The Action endpoint refused the secret patch.
	#[error(transparent)]
	Publish(#[from] PublishError),
}
impl Error {
	/// HTTP status attached to the failure, when one was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Config(_) => None,
			Self::AuthExchange(e) => e.status(),
			Self::Publish(e) => e.status(),
		}
	}

	/// Stable label for the error family, used by the legacy invocation payload.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Config(_) => "ConfigError",
			Self::AuthExchange(_) => "AuthExchangeError",
			Self::Publish(_) => "PublishError",
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required configuration key is absent or empty.
	#[error("Missing required configuration value `{key}`.")]
	MissingVar {
		/// Name of the missing key.
		key: &'static str,
	},
	/// Both a literal secret and a secret-store reference were supplied.
	#[error("Configure either `{literal}` or `{reference}`, not both.")]
	ConflictingSecret {
		/// Key carrying the literal secret.
		literal: &'static str,
		/// Key carrying the secret-store reference.
		reference: &'static str,
	},
	/// An identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// The authorization-server domain cannot form an HTTPS base URL.
	#[error("Authorization server domain `{domain}` is invalid: {reason}.")]
	InvalidDomain {
		/// Domain as configured.
		domain: String,
		/// Why it was rejected.
		reason: String,
	},
	/// A configured URL cannot be parsed.
	#[error("Configuration value `{key}` is not a valid URL.")]
	InvalidUrl {
		/// Key carrying the URL.
		key: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The per-call timeout is not a positive number of seconds.
	#[error("HTTP timeout `{value}` must be a positive number of seconds.")]
	InvalidTimeout {
		/// Raw configured value.
		value: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A request body could not be encoded as JSON.
	#[error("Request body could not be encoded.")]
	Encode(#[source] serde_json::Error),
	/// A secret-store reference could not be resolved.
	#[error("Client secret for {api} could not be resolved from the secret store.")]
	SecretLookup {
		/// Which credential set was being resolved.
		api: ApiSlot,
		/// Underlying lookup failure.
		#[source]
		source: SecretLookupError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised by a [`CredentialSource`](crate::credential::CredentialSource).
#[derive(Debug, ThisError)]
pub enum SecretLookupError {
	/// The store has no secret under the reference.
	#[error("Secret `{reference}` was not found.")]
	NotFound {
		/// Reference that was looked up.
		reference: String,
	},
	/// The source cannot resolve references at all.
	#[error("Secret `{reference}` is a store reference but no secret store is configured.")]
	Unsupported {
		/// Reference that was looked up.
		reference: String,
	},
	/// The store answered with a non-2xx status.
	#[error("Secret store returned HTTP {status} for `{reference}`.")]
	Rejected {
		/// Reference that was looked up.
		reference: String,
		/// HTTP status code.
		status: u16,
	},
	/// The stored payload is neither a string nor decodable binary.
	#[error("Secret `{reference}` has an unreadable payload.")]
	Malformed {
		/// Reference that was looked up.
		reference: String,
		/// Decoding failure.
		#[source]
		source: BoxError,
	},
	/// The store could not be reached.
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Redaction-safe description of one token exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangeContext {
	/// Which credential set was exchanged.
	pub api: ApiSlot,
	/// Client identifier presented to the token endpoint.
	pub client_id: String,
	/// Audience requested.
	pub audience: String,
	/// Token endpoint that was called.
	pub token_endpoint: String,
}
impl Display for ExchangeContext {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(
			f,
			"{} (client `{}`, audience `{}`, endpoint `{}`)",
			self.api, self.client_id, self.audience, self.token_endpoint
		)
	}
}

/// Token endpoint failures for a single client-credentials exchange.
#[derive(Debug, ThisError)]
pub enum AuthExchangeError {
	/// Token endpoint answered with a non-2xx status.
	#[error("Token endpoint rejected {context} with HTTP {status}: {reason}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Provider-supplied reason, scrubbed and truncated.
		reason: String,
		/// Exchange description.
		context: ExchangeContext,
	},
	/// A 2xx response carried no usable `access_token`.
	#[error("Token endpoint response for {context} is missing access_token.")]
	MissingAccessToken {
		/// HTTP status code.
		status: u16,
		/// Exchange description.
		context: ExchangeContext,
	},
	/// A 2xx response body was not valid token JSON.
	#[error("Token endpoint returned malformed JSON for {context}.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code.
		status: u16,
		/// Exchange description.
		context: ExchangeContext,
	},
	/// The request never produced a response (network failure or timeout).
	#[error("Token endpoint call failed for {context}.")]
	Transport {
		/// Transport failure.
		#[source]
		source: TransportError,
		/// Exchange description.
		context: ExchangeContext,
	},
}
impl AuthExchangeError {
	/// HTTP status code, when a response was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. }
			| Self::MissingAccessToken { status, .. }
			| Self::Parse { status, .. } => Some(*status),
			Self::Transport { .. } => None,
		}
	}

	/// Redaction-safe description of the failed exchange.
	pub fn context(&self) -> &ExchangeContext {
		match self {
			Self::Rejected { context, .. }
			| Self::MissingAccessToken { context, .. }
			| Self::Parse { context, .. }
			| Self::Transport { context, .. } => context,
		}
	}
}

/// Action endpoint failures for a secret patch.
#[derive(Debug, ThisError)]
pub enum PublishError {
	/// Action endpoint answered with a non-2xx status.
	#[error("Action endpoint rejected secret `{secret_name}` with HTTP {status}: {body}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Response body, scrubbed and truncated.
		body: String,
		/// Name of the secret being written.
		secret_name: String,
	},
	/// The request never produced a response (network failure or timeout).
	#[error("Action endpoint call failed for secret `{secret_name}`.")]
	Transport {
		/// Transport failure.
		#[source]
		source: TransportError,
		/// Name of the secret being written.
		secret_name: String,
	},
}
impl PublishError {
	/// HTTP status code, when a response was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. } => Some(*status),
			Self::Transport { .. } => None,
		}
	}
}

/// Transport-level failures (network, IO, timeouts).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The call exceeded the configured timeout.
	#[error("Request timed out.")]
	TimedOut,
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred.")]
	Io(#[from] std::io::Error),
	/// HTTP client failure without a structured source.
	#[error("HTTP client error occurred: {message}.")]
	Other {
		/// Client-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}

/// Failure of a whole rotation run, tagged with the stage that stopped it.
#[derive(Debug, ThisError)]
#[error("Rotation failed during {stage}: {source}")]
pub struct RotationError {
	/// Stage that failed; later stages never ran.
	pub stage: RotationStage,
	/// Underlying failure.
	#[source]
	pub source: Error,
}

/// Replaces every occurrence of each non-empty `secret` in `text` and truncates the result.
///
/// Each secret is matched raw and in its JSON-escaped forms (with and without `\/`), longest
/// form first, so a secret never survives as the tail of a longer one.
pub(crate) fn scrub(text: &str, secrets: &[&str]) -> String {
	let mut forms = secrets
		.iter()
		.filter(|secret| !secret.is_empty())
		.flat_map(|secret| secret_forms(secret))
		.collect::<Vec<_>>();

	forms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
	forms.dedup();

	let mut clean = text.trim().to_owned();

	for form in &forms {
		clean = clean.replace(form.as_str(), REDACTED);
	}

	truncate_preview(clean)
}

fn secret_forms(secret: &str) -> Vec<String> {
	let mut forms = vec![secret.to_owned()];

	if let Some(escaped) = serde_json::to_string(secret)
		.ok()
		.and_then(|quoted| Some(quoted.strip_prefix('"')?.strip_suffix('"')?.to_owned()))
	{
		forms.push(escaped.replace('/', "\\/"));
		forms.push(escaped);
	}

	forms
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= PREVIEW_LIMIT {
		return body;
	}

	let mut buf = body.chars().take(PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scrub_removes_every_secret_occurrence() {
		let clean = scrub("bad secret s3cr3t, again s3cr3t; token tok", &["s3cr3t", "tok", ""]);

		assert_eq!(clean, "bad secret <redacted>, again <redacted>; <redacted>en <redacted>");
		assert!(!clean.contains("s3cr3t"));
	}

	#[test]
	fn scrub_matches_json_escaped_secrets() {
		let secret = r#"ab/cd"ef\gh"#;
		let body = r#"{"message":"bad secret ab\/cd\"ef\\gh","echo":"ab/cd\"ef\\gh"}"#;
		let clean = scrub(body, &[secret]);

		assert_eq!(clean, r#"{"message":"bad secret <redacted>","echo":"<redacted>"}"#);
		assert!(!clean.contains("cd"));
	}

	#[test]
	fn scrub_replaces_longer_secrets_first() {
		let clean = scrub("a=tok-a b=tok-a-extra-tail", &["tok-a", "tok-a-extra-tail"]);

		assert_eq!(clean, "a=<redacted> b=<redacted>");
	}

	#[test]
	fn scrub_truncates_long_bodies() {
		let clean = scrub(&"x".repeat(PREVIEW_LIMIT + 10), &[]);

		assert_eq!(clean.chars().count(), PREVIEW_LIMIT + 1);
		assert!(clean.ends_with('…'));
	}

	#[test]
	fn error_status_follows_variant() {
		let context = ExchangeContext {
			api: ApiSlot::Api1,
			client_id: "client".into(),
			audience: "https://api.example.com".into(),
			token_endpoint: "https://example.auth0.com/oauth/token".into(),
		};
		let rejected: Error =
			AuthExchangeError::Rejected { status: 401, reason: "denied".into(), context }.into();
		let missing: Error = ConfigError::MissingVar { key: "AUTH0_DOMAIN" }.into();

		assert_eq!(rejected.status(), Some(401));
		assert_eq!(rejected.kind(), "AuthExchangeError");
		assert_eq!(missing.status(), None);
		assert_eq!(missing.kind(), "ConfigError");
	}
}
