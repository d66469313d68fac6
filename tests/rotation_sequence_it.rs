// std
use std::{
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	future::Future,
	pin::Pin,
	sync::Arc,
};
// crates.io
use parking_lot::Mutex;
use serde_json::{Value, json};
// self
use m2m_secret_rotator::{
	auth::TokenSecret,
	config::{RotationConfig, SecretRef},
	error::TransportError,
	http::{ResponseMetadata, ResponseMetadataSlot, RotationHttpClient, TransportErrorMapper},
	oauth2::{
		AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
		http::{Response, StatusCode},
	},
	obs::RotationStage,
	rotation::Rotator,
};

#[derive(Debug)]
struct FakeTransportError;
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Fake transport failure.")
	}
}
impl StdError for FakeTransportError {}

#[derive(Clone, Debug, PartialEq, Eq)]
struct RecordedRequest {
	method: String,
	path: String,
	authorization: Option<String>,
	body: Value,
}

/// In-process transport that records every request and answers from a fixed script.
#[derive(Clone, Default)]
struct FakeHttpClient {
	requests: Arc<Mutex<Vec<RecordedRequest>>>,
	api2_status: Option<u16>,
}
impl FakeHttpClient {
	fn failing_api2(status: u16) -> Self {
		Self { api2_status: Some(status), ..Default::default() }
	}

	fn recorded(&self) -> Vec<RecordedRequest> {
		self.requests.lock().clone()
	}
}
impl RotationHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		FakeHttpHandle { client: self.clone(), slot }
	}
}

struct FakeHttpHandle {
	client: FakeHttpClient,
	slot: ResponseMetadataSlot,
}
impl FakeHttpHandle {
	fn respond(&self, request: &RecordedRequest) -> (u16, Value) {
		match (request.method.as_str(), request.body["client_id"].as_str()) {
			("POST", Some("api1-client")) => (200, json!({ "access_token": "token-a" })),
			("POST", Some("api2-client")) => match self.client.api2_status {
				Some(status) => (status, json!({ "error": "unauthorized_client" })),
				None => (200, json!({ "access_token": "token-b", "expires_in": 86400 })),
			},
			("PATCH", _) => (200, json!({ "id": "act-1" })),
			_ => (404, json!({})),
		}
	}
}
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			assert!(
				self.slot.take().is_none(),
				"ResponseMetadataSlot must be clear before dispatching a request."
			);

			let recorded = RecordedRequest {
				method: request.method().to_string(),
				path: request.uri().path().to_owned(),
				authorization: request
					.headers()
					.get("authorization")
					.and_then(|value| value.to_str().ok())
					.map(str::to_owned),
				body: serde_json::from_slice(request.body())
					.expect("Every request body should be JSON."),
			};
			let (status, body) = self.respond(&recorded);

			self.client.requests.lock().push(recorded);
			self.slot.store(ResponseMetadata { status: Some(status) });

			let response = Response::builder()
				.status(StatusCode::from_u16(status).expect("Scripted status should be valid."))
				.body(body.to_string().into_bytes())
				.expect("Scripted response should build.");

			Ok(response)
		})
	}
}

struct FakeMapper;
impl TransportErrorMapper<FakeTransportError> for FakeMapper {
	fn map_transport_error(
		&self,
		_metadata: Option<&ResponseMetadata>,
		error: HttpClientError<FakeTransportError>,
	) -> TransportError {
		TransportError::Other { message: error.to_string() }
	}
}

fn config() -> RotationConfig {
	RotationConfig::builder()
		.domain("tenant.example.com")
		.api1_client_id("api1-client")
		.api1_client_secret(SecretRef::Literal(TokenSecret::new("api1-secret")))
		.api1_audience("https://api.example.com")
		.api2_client_id("api2-client")
		.api2_client_secret(SecretRef::Literal(TokenSecret::new("api2-secret")))
		.action_id("act-1")
		.build()
		.expect("Configuration fixture should build.")
}

#[tokio::test]
async fn rotation_calls_token_token_patch_in_order() {
	let http_client = FakeHttpClient::default();
	let rotator: Rotator<FakeHttpClient, FakeMapper> =
		Rotator::with_http_client(http_client.clone(), FakeMapper);

	rotator.rotate(&config()).await.expect("Scripted rotation should succeed.");

	let recorded = http_client.recorded();
	let calls = recorded
		.iter()
		.map(|request| (request.method.as_str(), request.path.as_str()))
		.collect::<Vec<_>>();

	assert_eq!(
		calls,
		[
			("POST", "/oauth/token"),
			("POST", "/oauth/token"),
			("PATCH", "/api/v2/actions/actions/act-1"),
		]
	);
	assert_eq!(recorded[0].body["audience"], "https://api.example.com");
	assert_eq!(recorded[1].body["audience"], "https://tenant.example.com/api/v2/");
	assert_eq!(recorded[0].body["grant_type"], "client_credentials");
	assert_eq!(recorded[2].authorization.as_deref(), Some("Bearer token-b"));
	assert_eq!(
		recorded[2].body,
		json!({ "secrets": [{ "name": "m2m_token", "value": "token-a" }] })
	);
	assert!(recorded[0].authorization.is_none());
}

#[tokio::test]
async fn failed_management_exchange_skips_publish() {
	let http_client = FakeHttpClient::failing_api2(401);
	let rotator: Rotator<FakeHttpClient, FakeMapper> =
		Rotator::with_http_client(http_client.clone(), FakeMapper);
	let err = rotator.rotate(&config()).await.expect_err("Scripted 401 should fail the run.");

	assert_eq!(err.stage, RotationStage::ExchangeApi2);
	assert_eq!(err.source.status(), Some(401));

	let recorded = http_client.recorded();

	assert_eq!(recorded.len(), 2);
	assert!(recorded.iter().all(|request| request.method == "POST"));
	assert!(!recorded.iter().any(|request| request.body.to_string().contains("token-a")));
}
