//! Validating builder for [`RotationConfig`](crate::config::RotationConfig).

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	auth::{ActionId, ClientId},
	config::{
		AuthorizationServer, ClientConfig, DEFAULT_REQUEST_TIMEOUT, RotationConfig, SecretRef,
		env::keys,
	},
	error::ConfigError,
};

/// Builder for [`RotationConfig`] values.
///
/// Every setter takes raw values; validation happens once in [`build`](Self::build). Missing
/// values are reported under their environment key names so errors read the same whether the
/// config came from the environment or from code.
#[derive(Clone, Debug, Default)]
pub struct RotationConfigBuilder {
	/// Authorization server domain.
	pub domain: Option<String>,
	/// API1 client identifier.
	pub api1_client_id: Option<String>,
	/// API1 client secret.
	pub api1_client_secret: Option<SecretRef>,
	/// API1 audience.
	pub api1_audience: Option<String>,
	/// Management API client identifier.
	pub api2_client_id: Option<String>,
	/// Management API client secret.
	pub api2_client_secret: Option<SecretRef>,
	/// Target Action identifier.
	pub action_id: Option<String>,
	/// Per-call timeout override.
	pub request_timeout: Option<StdDuration>,
}
impl RotationConfigBuilder {
	/// Sets the authorization server domain (`example.auth0.com`).
	pub fn domain(mut self, domain: impl Into<String>) -> Self {
		self.domain = Some(domain.into());

		self
	}

	/// Sets the API1 client identifier.
	pub fn api1_client_id(mut self, client_id: impl Into<String>) -> Self {
		self.api1_client_id = Some(client_id.into());

		self
	}

	/// Sets the API1 client secret source.
	pub fn api1_client_secret(mut self, secret: SecretRef) -> Self {
		self.api1_client_secret = Some(secret);

		self
	}

	/// Sets the API1 audience.
	pub fn api1_audience(mut self, audience: impl Into<String>) -> Self {
		self.api1_audience = Some(audience.into());

		self
	}

	/// Sets the Management API client identifier.
	pub fn api2_client_id(mut self, client_id: impl Into<String>) -> Self {
		self.api2_client_id = Some(client_id.into());

		self
	}

	/// Sets the Management API client secret source.
	pub fn api2_client_secret(mut self, secret: SecretRef) -> Self {
		self.api2_client_secret = Some(secret);

		self
	}

	/// Sets the Action whose secret is rewritten.
	pub fn action_id(mut self, action_id: impl Into<String>) -> Self {
		self.action_id = Some(action_id.into());

		self
	}

	/// Overrides the per-call timeout (defaults to 10 seconds).
	pub fn request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = Some(timeout);

		self
	}

	/// Validates the collected values and builds a [`RotationConfig`].
	pub fn build(self) -> Result<RotationConfig, ConfigError> {
		let server = AuthorizationServer::new(required(self.domain, keys::DOMAIN)?)?;
		let api1 = ClientConfig {
			client_id: ClientId::new(required(self.api1_client_id, keys::API1_CLIENT_ID)?)?,
			client_secret: required_secret(self.api1_client_secret, keys::API1_CLIENT_SECRET)?,
			audience: required(self.api1_audience, keys::API1_AUDIENCE)?,
		};
		let api2 = ClientConfig {
			client_id: ClientId::new(required(self.api2_client_id, keys::API2_CLIENT_ID)?)?,
			client_secret: required_secret(self.api2_client_secret, keys::API2_CLIENT_SECRET)?,
			audience: server.management_audience(),
		};
		let action_id = ActionId::new(required(self.action_id, keys::ACTIONS_ID)?)?;
		let request_timeout = match self.request_timeout {
			Some(timeout) if timeout.is_zero() =>
				return Err(ConfigError::InvalidTimeout { value: format!("{timeout:?}") }),
			Some(timeout) => timeout,
			None => DEFAULT_REQUEST_TIMEOUT,
		};

		Ok(RotationConfig { server, api1, api2, action_id, request_timeout })
	}
}

fn required(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
	value
		.map(|value| value.trim().to_owned())
		.filter(|value| !value.is_empty())
		.ok_or(ConfigError::MissingVar { key })
}

fn required_secret(value: Option<SecretRef>, key: &'static str) -> Result<SecretRef, ConfigError> {
	match value {
		Some(SecretRef::Literal(secret)) if secret.is_blank() => Err(ConfigError::MissingVar { key }),
		Some(SecretRef::Reference(reference)) if reference.trim().is_empty() =>
			Err(ConfigError::MissingVar { key }),
		Some(secret) => Ok(secret),
		None => Err(ConfigError::MissingVar { key }),
	}
}
