//! Rotation configuration passed explicitly into every run.
//!
//! `config` holds the validated [`RotationConfig`], the [`AuthorizationServer`] endpoint
//! helpers derived from the tenant domain, and the [`SecretRef`] that lets each client
//! secret come either from configuration or from a secret store. `builder` validates raw
//! values. `env` maps environment-style keys onto the builder.

pub mod builder;
pub mod env;

pub use builder::*;
pub use env::*;

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::{ActionId, ApiSlot, ClientId, TokenSecret},
	error::ConfigError,
};

/// Name of the Action secret that receives the rotated token.
pub const M2M_SECRET_NAME: &str = "m2m_token";
/// Per-call timeout applied when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Where a client secret comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SecretRef {
	/// Secret supplied directly in configuration.
	Literal(TokenSecret),
	/// Key resolved through a [`CredentialSource`](crate::credential::CredentialSource).
	Reference(String),
}

/// Authorization server rooted at `https://{domain}/`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationServer {
	domain: String,
	base: Url,
}
impl AuthorizationServer {
	/// Validates `domain` (host with optional port, no scheme or path).
	pub fn new(domain: impl Into<String>) -> Result<Self, ConfigError> {
		let domain = domain.into();
		let trimmed = domain.trim().trim_end_matches('/');
		let invalid = |reason: &str| ConfigError::InvalidDomain {
			domain: domain.clone(),
			reason: reason.to_owned(),
		};

		if trimmed.is_empty() {
			return Err(invalid("domain is empty"));
		}
		if trimmed.contains("://") {
			return Err(invalid("domain must not include a scheme"));
		}

		let base = Url::parse(&format!("https://{trimmed}/"))
			.map_err(|e| invalid(&e.to_string()))?;

		if base.host_str().is_none_or(str::is_empty) {
			return Err(invalid("domain has no host"));
		}
		if base.path() != "/" || base.query().is_some() || base.fragment().is_some() {
			return Err(invalid("domain must not include a path, query, or fragment"));
		}
		if !base.username().is_empty() || base.password().is_some() {
			return Err(invalid("domain must not include credentials"));
		}

		Ok(Self { domain: trimmed.to_owned(), base })
	}

	/// Domain as configured, without trailing slash.
	pub fn domain(&self) -> &str {
		&self.domain
	}

	/// `https://{domain}/oauth/token`.
	pub fn token_endpoint(&self) -> Url {
		self.endpoint(&["oauth", "token"])
	}

	/// `https://{domain}/api/v2/`, the Management API audience.
	///
	/// Uses the domain exactly as configured; the host is not case-normalized.
	pub fn management_audience(&self) -> String {
		format!("https://{}/api/v2/", self.domain)
	}

	/// `https://{domain}/api/v2/actions/actions/{action_id}`.
	pub fn action_endpoint(&self, action_id: &ActionId) -> Url {
		self.endpoint(&["api", "v2", "actions", "actions", action_id.as_ref()])
	}

	fn endpoint(&self, segments: &[&str]) -> Url {
		let mut url = self.base.clone();

		// An https base always has path segments.
		if let Ok(mut path) = url.path_segments_mut() {
			path.pop_if_empty().extend(segments);
		}

		url
	}
}

/// Credentials configured for one API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// OAuth 2.0 client identifier.
	pub client_id: ClientId,
	/// Literal secret or store reference.
	pub client_secret: SecretRef,
	/// Audience requested for this client.
	pub audience: String,
}

/// Validated configuration for one rotation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RotationConfig {
	/// Authorization server the exchanges and the publish target.
	pub server: AuthorizationServer,
	/// Credentials whose token gets published.
	pub api1: ClientConfig,
	/// Management API credentials; the audience is always [`AuthorizationServer::management_audience`].
	pub api2: ClientConfig,
	/// Action receiving the secret.
	pub action_id: ActionId,
	/// Upper bound for each HTTP call.
	pub request_timeout: StdDuration,
}
impl RotationConfig {
	/// Creates a new builder.
	pub fn builder() -> RotationConfigBuilder {
		RotationConfigBuilder::default()
	}

	/// Credentials configured for `api`.
	pub fn client(&self, api: ApiSlot) -> &ClientConfig {
		match api {
			ApiSlot::Api1 => &self.api1,
			ApiSlot::Api2 => &self.api2,
		}
	}

	/// Endpoint patched with the rotated secret.
	pub fn action_endpoint(&self) -> Url {
		self.server.action_endpoint(&self.action_id)
	}
}
