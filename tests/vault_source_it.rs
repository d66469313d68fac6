mod common;

// std
use std::time::Duration;
// crates.io
use httpmock::prelude::*;
// self
use common::test_reqwest_http_client;
use m2m_secret_rotator::{
	auth::TokenSecret,
	credential::{CredentialSource, VaultSource},
	error::SecretLookupError,
	url::Url,
};

const VAULT_TOKEN: &str = "hvs.test-token";

fn vault_source(server: &MockServer) -> VaultSource {
	VaultSource::new(
		Url::parse(&server.base_url()).expect("Mock Vault address should parse."),
		TokenSecret::new(VAULT_TOKEN),
		"secret",
		test_reqwest_http_client(Duration::from_secs(5)),
	)
}

#[tokio::test]
async fn vault_reads_string_secret_with_token_header() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/secret/data/auth0/api1").header("x-vault-token", VAULT_TOKEN);
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":{"data":{"value":"api1-from-vault"},"metadata":{"version":3}}}"#);
		})
		.await;
	let secret = vault_source(&server)
		.lookup("auth0/api1")
		.await
		.expect("Vault lookup should succeed.");

	assert_eq!(secret.expose(), "api1-from-vault");

	mock.assert_async().await;
}

#[tokio::test]
async fn vault_decodes_binary_secret() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/secret/data/auth0/bin");
			then.status(200).body(r#"{"data":{"data":{"value_base64":"YmluYXJ5LXNlY3JldA=="}}}"#);
		})
		.await;

	let secret = vault_source(&server)
		.lookup("auth0/bin")
		.await
		.expect("Binary Vault secret should decode.");

	assert_eq!(secret.expose(), "binary-secret");
}

#[tokio::test]
async fn vault_maps_missing_and_forbidden_secrets() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/secret/data/auth0/missing");
			then.status(404).body(r#"{"errors":[]}"#);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/secret/data/auth0/forbidden");
			then.status(403).body(r#"{"errors":["permission denied"]}"#);
		})
		.await;

	let source = vault_source(&server);

	assert!(matches!(
		source.lookup("auth0/missing").await,
		Err(SecretLookupError::NotFound { reference }) if reference == "auth0/missing"
	));
	assert!(matches!(
		source.lookup("auth0/forbidden").await,
		Err(SecretLookupError::Rejected { status: 403, .. })
	));
}

#[tokio::test]
async fn vault_rejects_unexpected_payload_shape() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/secret/data/auth0/odd");
			then.status(200).body(r#"{"data":{"value":"not-kv-v2"}}"#);
		})
		.await;

	let err = vault_source(&server)
		.lookup("auth0/odd")
		.await
		.expect_err("KV v1 shaped payloads should be rejected.");

	assert!(matches!(err, SecretLookupError::Malformed { .. }));
	assert!(!format!("{err:?}").contains("not-kv-v2"));
}
