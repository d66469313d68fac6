//! Environment-style key mapping onto the configuration builder.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	auth::TokenSecret,
	config::{RotationConfig, RotationConfigBuilder, SecretRef},
	error::ConfigError,
};

/// Environment keys read by [`RotationConfig::from_env`].
pub mod keys {
	/// Authorization server domain.
	pub const DOMAIN: &str = "AUTH0_DOMAIN";
	/// API1 client identifier.
	pub const API1_CLIENT_ID: &str = "AUTH0_CLIENT_ID";
	/// API1 literal client secret.
	pub const API1_CLIENT_SECRET: &str = "AUTH0_CLIENT_SECRET";
	/// API1 client secret reference in the secret store.
	pub const API1_CLIENT_SECRET_REF: &str = "AUTH0_CLIENT_SECRET_ARN";
	/// API1 audience.
	pub const API1_AUDIENCE: &str = "AUTH0_AUDIENCE";
	/// Management API client identifier.
	pub const API2_CLIENT_ID: &str = "AUTH0_API2_CLIENT_ID";
	/// Management API literal client secret.
	pub const API2_CLIENT_SECRET: &str = "AUTH0_API2_CLIENT_SECRET";
	/// Management API client secret reference in the secret store.
	pub const API2_CLIENT_SECRET_REF: &str = "AUTH0_API2_CLIENT_SECRET_ARN";
	/// Target Action identifier.
	pub const ACTIONS_ID: &str = "AUTH0_ACTIONS_ID";
	/// Optional per-call timeout in whole seconds.
	pub const HTTP_TIMEOUT_SECS: &str = "AUTH0_HTTP_TIMEOUT_SECS";
}

impl RotationConfig {
	/// Reads configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads configuration from any key/value source; empty values count as absent.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
		let mut builder = RotationConfigBuilder {
			domain: get(keys::DOMAIN),
			api1_client_id: get(keys::API1_CLIENT_ID),
			api1_client_secret: secret_ref(
				get(keys::API1_CLIENT_SECRET),
				get(keys::API1_CLIENT_SECRET_REF),
				keys::API1_CLIENT_SECRET,
				keys::API1_CLIENT_SECRET_REF,
			)?,
			api1_audience: get(keys::API1_AUDIENCE),
			api2_client_id: get(keys::API2_CLIENT_ID),
			api2_client_secret: secret_ref(
				get(keys::API2_CLIENT_SECRET),
				get(keys::API2_CLIENT_SECRET_REF),
				keys::API2_CLIENT_SECRET,
				keys::API2_CLIENT_SECRET_REF,
			)?,
			action_id: get(keys::ACTIONS_ID),
			request_timeout: None,
		};

		if let Some(raw) = get(keys::HTTP_TIMEOUT_SECS) {
			builder = builder.request_timeout(parse_timeout(&raw)?);
		}

		builder.build()
	}
}

fn secret_ref(
	literal: Option<String>,
	reference: Option<String>,
	literal_key: &'static str,
	reference_key: &'static str,
) -> Result<Option<SecretRef>, ConfigError> {
	match (literal, reference) {
		(Some(_), Some(_)) =>
			Err(ConfigError::ConflictingSecret { literal: literal_key, reference: reference_key }),
		(Some(secret), None) => Ok(Some(SecretRef::Literal(TokenSecret::new(secret)))),
		(None, Some(reference)) => Ok(Some(SecretRef::Reference(reference.trim().to_owned()))),
		(None, None) => Ok(None),
	}
}

fn parse_timeout(raw: &str) -> Result<StdDuration, ConfigError> {
	raw.trim()
		.parse::<u64>()
		.ok()
		.filter(|secs| *secs > 0)
		.map(StdDuration::from_secs)
		.ok_or_else(|| ConfigError::InvalidTimeout { value: raw.to_owned() })
}
