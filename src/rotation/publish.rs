//! Secret patch against an Auth0 Action.

// crates.io
use oauth2::{
	AsyncHttpClient,
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, PublishError},
	http::{ResponseMetadataSlot, RotationHttpClient, TransportErrorMapper},
	rotation::{self, JSON_MEDIA_TYPE},
};

/// One named secret inside a [`SecretPatchRequest`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionSecret<'a> {
	/// Secret name as seen by the Action.
	pub name: &'a str,
	/// Secret value.
	pub value: &'a TokenSecret,
}

/// PATCH body `{"secrets": [{"name", "value"}]}` carrying exactly one secret.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SecretPatchRequest<'a> {
	secrets: [ActionSecret<'a>; 1],
}
impl<'a> SecretPatchRequest<'a> {
	/// Builds a patch that writes `value` under `name`.
	pub fn single(name: &'a str, value: &'a TokenSecret) -> Self {
		Self { secrets: [ActionSecret { name, value }] }
	}

	/// The secret being written.
	pub fn secret(&self) -> &ActionSecret<'a> {
		&self.secrets[0]
	}
}

/// Writes secrets into an Action through the Management API.
pub struct SecretPublisher<C, M>
where
	C: ?Sized + RotationHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
}
impl<C, M> SecretPublisher<C, M>
where
	C: ?Sized + RotationHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a publisher over the provided transport + mapper pair.
	pub fn new(http_client: impl Into<Arc<C>>, transport_mapper: impl Into<Arc<M>>) -> Self {
		Self { http_client: http_client.into(), transport_mapper: transport_mapper.into() }
	}

	/// PATCHes `secret_name = secret_value` into the Action at `action_endpoint`, authorized
	/// by `bearer_token`.
	///
	/// Succeeds only on a 2xx response. Neither the value nor the bearer token appears in
	/// the returned error.
	pub async fn publish(
		&self,
		action_endpoint: &Url,
		bearer_token: &TokenSecret,
		secret_name: &str,
		secret_value: &TokenSecret,
	) -> Result<()> {
		let body = serde_json::to_vec(&SecretPatchRequest::single(secret_name, secret_value))
			.map_err(ConfigError::Encode)?;
		let request = Request::builder()
			.method(Method::PATCH)
			.uri(action_endpoint.as_str())
			.header(AUTHORIZATION, format!("Bearer {}", bearer_token.expose()))
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

				return Err(
					PublishError::Transport { source, secret_name: secret_name.to_owned() }.into()
				);
			},
		};

		if response.status().is_success() {
			return Ok(());
		}

		let body = rotation::body_preview(
			response.body(),
			&[secret_value.expose(), bearer_token.expose()],
		);

		Err(PublishError::Rejected {
			status: response.status().as_u16(),
			body,
			secret_name: secret_name.to_owned(),
		}
		.into())
	}
}
impl<C, M> Clone for SecretPublisher<C, M>
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
impl<C, M> Debug for SecretPublisher<C, M>
where
	C: ?Sized + RotationHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("SecretPublisher(..)")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn patch_body_carries_one_named_secret() {
		let value = TokenSecret::new("token-a");
		let patch = SecretPatchRequest::single("m2m_token", &value);

		assert_eq!(
			serde_json::to_value(&patch).expect("Patch should serialize."),
			serde_json::json!({ "secrets": [{ "name": "m2m_token", "value": "token-a" }] })
		);
		assert_eq!(patch.secret().name, "m2m_token");
		assert!(!format!("{patch:?}").contains("token-a"));
	}
}
