//! HashiCorp Vault KV v2 credential source.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	credential::{CredentialSource, LookupFuture, SecretPayload, malformed},
	error::{ConfigError, SecretLookupError, TransportError},
	http::ReqwestHttpClient,
};

/// Environment key carrying the Vault address.
pub const VAULT_ADDR_VAR: &str = "VAULT_ADDR";
/// Environment key carrying the Vault token.
pub const VAULT_TOKEN_VAR: &str = "VAULT_TOKEN";
/// Environment key carrying the KV v2 mount (defaults to `secret`).
pub const VAULT_MOUNT_VAR: &str = "VAULT_KV_MOUNT";

const DEFAULT_MOUNT: &str = "secret";

/// Reads client secrets from `GET {address}/v1/{mount}/data/{reference}`.
///
/// The secret lives under `data.data.value`, or base64-encoded under
/// `data.data.value_base64` for binary secrets.
#[derive(Clone)]
pub struct VaultSource {
	address: Url,
	token: TokenSecret,
	mount: String,
	http_client: ReqwestHttpClient,
}
impl VaultSource {
	/// Creates a source that reuses `http_client`; its timeout bounds every lookup.
	pub fn new(
		address: Url,
		token: TokenSecret,
		mount: impl Into<String>,
		http_client: ReqwestHttpClient,
	) -> Self {
		let mount = mount.into().trim_matches('/').to_owned();

		Self { address, token, mount, http_client }
	}

	/// Builds a source from `VAULT_ADDR`, `VAULT_TOKEN`, and `VAULT_KV_MOUNT`.
	pub fn from_env(timeout: StdDuration) -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok(), timeout)
	}

	/// Same as [`VaultSource::from_env`], reading keys through `lookup`; empty values count
	/// as absent.
	pub fn from_lookup<F>(lookup: F, timeout: StdDuration) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |key: &'static str| {
			lookup(key).filter(|value| !value.trim().is_empty()).ok_or(ConfigError::MissingVar { key })
		};
		let raw_address = var(VAULT_ADDR_VAR)?;
		let address = Url::parse(&raw_address)
			.map_err(|source| ConfigError::InvalidUrl { key: VAULT_ADDR_VAR, source })?;
		let token = TokenSecret::new(var(VAULT_TOKEN_VAR)?);
		let mount = var(VAULT_MOUNT_VAR).unwrap_or_else(|_| DEFAULT_MOUNT.into());

		Ok(Self::new(address, token, mount, ReqwestHttpClient::with_timeout(timeout)?))
	}

	fn secret_url(&self, reference: &str) -> Url {
		let mut url = self.address.clone();

		if let Ok(mut path) = url.path_segments_mut() {
			path.pop_if_empty()
				.push("v1")
				.extend(self.mount.split('/'))
				.push("data")
				.extend(reference.trim_matches('/').split('/'));
		}

		url
	}

	async fn fetch(&self, reference: &str) -> Result<TokenSecret, SecretLookupError> {
		let response = self
			.http_client
			.get(self.secret_url(reference))
			.header("X-Vault-Token", self.token.expose())
			.send()
			.await
			.map_err(vault_transport_error)?;
		let status = response.status();

		if status == reqwest::StatusCode::NOT_FOUND {
			return Err(SecretLookupError::NotFound { reference: reference.to_owned() });
		}
		if !status.is_success() {
			return Err(SecretLookupError::Rejected {
				reference: reference.to_owned(),
				status: status.as_u16(),
			});
		}

		let body = response.bytes().await.map_err(vault_transport_error)?;
		let mut de = serde_json::Deserializer::from_slice(&body);
		let envelope: VaultKvResponse =
			serde_path_to_error::deserialize(&mut de).map_err(|e| malformed(reference, e))?;
		let VaultKvFields { value, value_base64 } = envelope.data.data;
		let payload = match (value, value_base64) {
			(Some(text), _) => SecretPayload::Text(text),
			(None, Some(encoded)) =>
				SecretPayload::from_base64(&encoded).map_err(|e| malformed(reference, e))?,
			(None, None) =>
				return Err(SecretLookupError::NotFound { reference: reference.to_owned() }),
		};

		payload.into_secret(reference)
	}
}
impl CredentialSource for VaultSource {
	fn lookup<'a>(&'a self, reference: &'a str) -> LookupFuture<'a> {
		Box::pin(self.fetch(reference))
	}
}
impl Debug for VaultSource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("VaultSource")
			.field("address", &self.address.as_str())
			.field("mount", &self.mount)
			.field("token", &self.token)
			.finish()
	}
}

#[derive(Debug, Deserialize)]
struct VaultKvResponse {
	data: VaultKvData,
}

#[derive(Debug, Deserialize)]
struct VaultKvData {
	data: VaultKvFields,
}

#[derive(Deserialize)]
struct VaultKvFields {
	#[serde(default)]
	value: Option<String>,
	#[serde(default)]
	value_base64: Option<String>,
}
impl Debug for VaultKvFields {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("VaultKvFields(<redacted>)")
	}
}

fn vault_transport_error(err: ReqwestError) -> SecretLookupError {
	if err.is_timeout() {
		TransportError::TimedOut.into()
	} else {
		TransportError::from(err).into()
	}
}
