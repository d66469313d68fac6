//! Client secret resolution.
//!
//! A [`SecretRef::Literal`] is used as-is; a [`SecretRef::Reference`] is handed to the
//! rotator's [`CredentialSource`]. [`DirectSource`] refuses references and suits
//! deployments that inject secrets straight into configuration. [`MemorySource`] keeps
//! secrets in-process. `VaultSource` (feature `reqwest`) reads HashiCorp Vault KV v2.

#[cfg(feature = "reqwest")] pub mod vault;

#[cfg(feature = "reqwest")] pub use vault::VaultSource;

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
// self
use crate::{
	_prelude::*,
	auth::{ApiSlot, ClientCredentials, TokenSecret},
	config::{RotationConfig, SecretRef},
	error::{BoxError, ConfigError, SecretLookupError},
};

/// Future returned by [`CredentialSource::lookup`].
pub type LookupFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TokenSecret, SecretLookupError>> + 'a + Send>>;

/// Strategy that turns a secret-store reference into a client secret.
pub trait CredentialSource
where
	Self: Send + Sync,
{
	/// Resolves `reference` into the secret it names.
	fn lookup<'a>(&'a self, reference: &'a str) -> LookupFuture<'a>;
}

/// Secret as held by a store: text, or raw bytes that must decode as UTF-8.
#[derive(Clone, PartialEq, Eq)]
pub enum SecretPayload {
	/// String secret.
	Text(String),
	/// Binary secret.
	Binary(Vec<u8>),
}
impl SecretPayload {
	/// Decodes a standard base64 binary payload.
	pub fn from_base64(encoded: &str) -> Result<Self, base64::DecodeError> {
		STANDARD.decode(encoded.trim()).map(Self::Binary)
	}

	/// Converts the payload into a [`TokenSecret`], rejecting blank or non-UTF-8 values.
	pub fn into_secret(self, reference: &str) -> Result<TokenSecret, SecretLookupError> {
		let text = match self {
			Self::Text(text) => text,
			Self::Binary(bytes) => String::from_utf8(bytes).map_err(|e| malformed(reference, e))?,
		};
		let secret = TokenSecret::new(text);

		if secret.is_blank() {
			return Err(SecretLookupError::NotFound { reference: reference.to_owned() });
		}

		Ok(secret)
	}
}
impl Debug for SecretPayload {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Text(_) => f.write_str("SecretPayload::Text(<redacted>)"),
			Self::Binary(bytes) => write!(f, "SecretPayload::Binary({} bytes)", bytes.len()),
		}
	}
}
impl From<&str> for SecretPayload {
	fn from(value: &str) -> Self {
		Self::Text(value.to_owned())
	}
}
impl From<String> for SecretPayload {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

/// Source for literal-only configurations; every reference lookup fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectSource;
impl CredentialSource for DirectSource {
	fn lookup<'a>(&'a self, reference: &'a str) -> LookupFuture<'a> {
		Box::pin(async move {
			Err(SecretLookupError::Unsupported { reference: reference.to_owned() })
		})
	}
}

/// Thread-safe in-process secret map for tests and embedding.
#[derive(Clone, Debug, Default)]
pub struct MemorySource(Arc<RwLock<HashMap<String, SecretPayload>>>);
impl MemorySource {
	/// Stores (or replaces) a secret under `reference`.
	pub fn insert(&self, reference: impl Into<String>, payload: impl Into<SecretPayload>) {
		self.0.write().insert(reference.into(), payload.into());
	}

	/// Builder-style [`insert`](Self::insert).
	pub fn with_secret(
		self,
		reference: impl Into<String>,
		payload: impl Into<SecretPayload>,
	) -> Self {
		self.insert(reference, payload);

		self
	}
}
impl CredentialSource for MemorySource {
	fn lookup<'a>(&'a self, reference: &'a str) -> LookupFuture<'a> {
		let payload = self.0.read().get(reference).cloned();

		Box::pin(async move {
			payload
				.ok_or_else(|| SecretLookupError::NotFound { reference: reference.to_owned() })?
				.into_secret(reference)
		})
	}
}

/// Resolves the configured credentials for `api` into a ready-to-send request.
pub async fn resolve_credentials(
	source: &dyn CredentialSource,
	config: &RotationConfig,
	api: ApiSlot,
) -> Result<ClientCredentials, ConfigError> {
	let client = config.client(api);
	let client_secret = match &client.client_secret {
		SecretRef::Literal(secret) => secret.clone(),
		SecretRef::Reference(reference) => source
			.lookup(reference)
			.await
			.map_err(|err| ConfigError::SecretLookup { api, source: err })?,
	};

	Ok(ClientCredentials::new(api, client.client_id.clone(), client_secret, &client.audience))
}

pub(crate) fn malformed(
	reference: &str,
	src: impl 'static + Send + Sync + std::error::Error,
) -> SecretLookupError {
	let source: BoxError = Box::new(src);

	SecretLookupError::Malformed { reference: reference.to_owned(), source }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn config(api1: SecretRef) -> RotationConfig {
		RotationConfig::builder()
			.domain("example.auth0.com")
			.api1_client_id("api1-client")
			.api1_client_secret(api1)
			.api1_audience("https://api.example.com")
			.api2_client_id("api2-client")
			.api2_client_secret(SecretRef::Literal(TokenSecret::new("api2-secret")))
			.action_id("act-1")
			.build()
			.expect("Config fixture should build.")
	}

	#[tokio::test]
	async fn literal_secrets_bypass_the_source() {
		let config = config(SecretRef::Literal(TokenSecret::new("api1-secret")));
		let credentials = resolve_credentials(&DirectSource, &config, ApiSlot::Api1)
			.await
			.expect("Literal secret should resolve without a store.");

		assert_eq!(credentials.client_secret.expose(), "api1-secret");
		assert_eq!(credentials.audience, "https://api.example.com");
		assert_eq!(credentials.grant_type(), "client_credentials");
	}

	#[tokio::test]
	async fn direct_source_rejects_references() {
		let config = config(SecretRef::Reference("auth0/api1".into()));
		let err = resolve_credentials(&DirectSource, &config, ApiSlot::Api1)
			.await
			.expect_err("References need a secret store.");

		assert!(matches!(
			err,
			ConfigError::SecretLookup {
				api: ApiSlot::Api1,
				source: SecretLookupError::Unsupported { .. }
			}
		));
	}

	#[tokio::test]
	async fn memory_source_resolves_text_and_binary() {
		let source = MemorySource::default()
			.with_secret("auth0/api1", "from-store")
			.with_secret(
				"auth0/bin",
				SecretPayload::from_base64("YmluYXJ5LXNlY3JldA==")
					.expect("Fixture should be valid base64."),
			);
		let config = config(SecretRef::Reference("auth0/api1".into()));
		let credentials = resolve_credentials(&source, &config, ApiSlot::Api1)
			.await
			.expect("Stored secret should resolve.");

		assert_eq!(credentials.client_secret.expose(), "from-store");

		let binary = source.lookup("auth0/bin").await.expect("Binary secret should decode.");

		assert_eq!(binary.expose(), "binary-secret");
		assert!(matches!(
			source.lookup("auth0/missing").await,
			Err(SecretLookupError::NotFound { .. })
		));
	}

	#[test]
	fn non_utf8_binary_is_malformed() {
		let err = SecretPayload::Binary(vec![0xff, 0xfe])
			.into_secret("auth0/bad")
			.expect_err("Invalid UTF-8 should be rejected.");

		assert!(matches!(err, SecretLookupError::Malformed { .. }));
		assert_eq!(format!("{:?}", SecretPayload::from("x")), "SecretPayload::Text(<redacted>)");
	}
}
