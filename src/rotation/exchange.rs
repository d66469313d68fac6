//! One OAuth2 client-credentials exchange against the tenant token endpoint.

// crates.io
use oauth2::{
	AsyncHttpClient,
	http::{
		Method, Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::{ClientCredentials, OAuthErrorWire, TokenResponse, TokenResponseWire},
	error::{AuthExchangeError, ConfigError, ExchangeContext},
	http::{ResponseMetadataSlot, RotationHttpClient, TransportErrorMapper},
	rotation::{self, JSON_MEDIA_TYPE},
};

/// Performs client-credentials grants with a JSON request body.
///
/// Auth0 expects `{client_id, client_secret, audience, grant_type}` as JSON rather than a
/// form-encoded body, so requests are built directly and sent through the
/// [`RotationHttpClient`] handle. Each call is attempted exactly once.
pub struct TokenExchanger<C, M>
where
	C: ?Sized + RotationHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
}
impl<C, M> TokenExchanger<C, M>
where
	C: ?Sized + RotationHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an exchanger over the provided transport + mapper pair.
	pub fn new(http_client: impl Into<Arc<C>>, transport_mapper: impl Into<Arc<M>>) -> Self {
		Self { http_client: http_client.into(), transport_mapper: transport_mapper.into() }
	}

	/// Exchanges `credentials` for an access token at `token_endpoint`.
	///
	/// Succeeds only on a 2xx response carrying a non-empty `access_token`.
	pub async fn exchange(
		&self,
		credentials: &ClientCredentials,
		token_endpoint: &Url,
	) -> Result<TokenResponse> {
		let context = ExchangeContext {
			api: credentials.api,
			client_id: credentials.client_id.to_string(),
			audience: credentials.audience.clone(),
			token_endpoint: token_endpoint.to_string(),
		};
		let body = serde_json::to_vec(credentials).map_err(ConfigError::Encode)?;
		let request = Request::builder()
			.method(Method::POST)
			.uri(token_endpoint.as_str())
			.header(CONTENT_TYPE, JSON_MEDIA_TYPE)
			.header(ACCEPT, JSON_MEDIA_TYPE)
			.body(body)
			.map_err(ConfigError::from)?;
		let slot = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(slot.clone());
		let response = match handle.call(request).await {
			Ok(response) => response,
			Err(err) => {
				let source = self.transport_mapper.map_transport_error(slot.take().as_ref(), err);

				return Err(AuthExchangeError::Transport { source, context }.into());
			},
		};
		let status = response.status().as_u16();
		let body = response.body();

		if !response.status().is_success() {
			let reason = rejection_reason(body, credentials);

			return Err(AuthExchangeError::Rejected { status, reason, context }.into());
		}

		let mut de = serde_json::Deserializer::from_slice(body);
		let wire: TokenResponseWire = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| AuthExchangeError::Parse { source, status, context: context.clone() })?;

		TokenResponse::from_wire(wire, OffsetDateTime::now_utc())
			.ok_or_else(|| AuthExchangeError::MissingAccessToken { status, context }.into())
	}
}
impl<C, M> Clone for TokenExchanger<C, M>
where
	C: ?Sized + RotationHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: Arc::clone(&self.http_client),
			transport_mapper: Arc::clone(&self.transport_mapper),
		}
	}
}
impl<C, M> Debug for TokenExchanger<C, M>
where
	C: ?Sized + RotationHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenExchanger(..)")
	}
}

fn rejection_reason(body: &[u8], credentials: &ClientCredentials) -> String {
	let secret = credentials.client_secret.expose();

	match serde_json::from_slice::<OAuthErrorWire>(body).ok().and_then(OAuthErrorWire::reason) {
		Some(reason) => rotation::body_preview(reason.as_bytes(), &[secret]),
		None => rotation::body_preview(body, &[secret]),
	}
}
