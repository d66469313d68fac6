//! Client-credentials grant inputs.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, TokenSecret},
};

/// Grant identifier sent with every exchange.
pub const CLIENT_CREDENTIALS_GRANT: &str = "client_credentials";

/// The two independent credential sets used by one rotation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiSlot {
	/// Credentials for the custom API whose token gets published.
	Api1,
	/// Credentials for the Management API that authorizes the publish.
	Api2,
}
impl ApiSlot {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ApiSlot::Api1 => "api1",
			ApiSlot::Api2 => "api2",
		}
	}
}
impl Display for ApiSlot {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Resolved client-credentials request; serializes as the JSON token request body.
///
/// Each run builds two of these and never reuses one across exchanges.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClientCredentials {
	/// Credential set this request belongs to.
	#[serde(skip)]
	pub api: ApiSlot,
	/// OAuth 2.0 client identifier.
	pub client_id: ClientId,
	/// Client secret; redacted in `Debug`.
	pub client_secret: TokenSecret,
	/// Audience (API identifier) the token is requested for.
	pub audience: String,
	grant_type: &'static str,
}
impl ClientCredentials {
	/// Builds a `client_credentials` request for the given slot.
	pub fn new(
		api: ApiSlot,
		client_id: ClientId,
		client_secret: TokenSecret,
		audience: impl Into<String>,
	) -> Self {
		Self {
			api,
			client_id,
			client_secret,
			audience: audience.into(),
			grant_type: CLIENT_CREDENTIALS_GRANT,
		}
	}

	/// Grant type carried in the request body.
	pub fn grant_type(&self) -> &'static str {
		self.grant_type
	}
}
