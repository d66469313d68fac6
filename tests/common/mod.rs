//! Shared fixtures for reqwest-backed integration tests.

#![allow(dead_code)]

// std
use std::time::Duration;
// crates.io
use httpmock::MockServer;
use serde_json::{Value, json};
// self
use m2m_secret_rotator::{
	auth::TokenSecret,
	config::{RotationConfig, RotationConfigBuilder, SecretRef},
	http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
	reqwest::Client,
	rotation::ReqwestRotator,
};

pub const API1_CLIENT_ID: &str = "api1-client";
pub const API1_CLIENT_SECRET: &str = "api1-s3cret-value";
pub const API1_AUDIENCE: &str = "https://api.example.com";
pub const API2_CLIENT_ID: &str = "api2-client";
pub const API2_CLIENT_SECRET: &str = "api2-s3cret-value";
pub const ACTION_ID: &str = "act-123";
pub const TOKEN_A: &str = "token-a-for-custom-api";
pub const TOKEN_B: &str = "token-b-for-management-api";

/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
/// `httpmock` during tests.
pub fn test_reqwest_http_client(timeout: Duration) -> ReqwestHttpClient {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.timeout(timeout)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

pub fn test_rotator(timeout: Duration) -> ReqwestRotator {
	ReqwestRotator::with_http_client(test_reqwest_http_client(timeout), ReqwestTransportErrorMapper)
}

/// Configuration pointing every endpoint at `server`.
pub fn config_builder(server: &MockServer) -> RotationConfigBuilder {
	RotationConfig::builder()
		.domain(server.address().to_string())
		.api1_client_id(API1_CLIENT_ID)
		.api1_client_secret(SecretRef::Literal(TokenSecret::new(API1_CLIENT_SECRET)))
		.api1_audience(API1_AUDIENCE)
		.api2_client_id(API2_CLIENT_ID)
		.api2_client_secret(SecretRef::Literal(TokenSecret::new(API2_CLIENT_SECRET)))
		.action_id(ACTION_ID)
}

pub fn test_config(server: &MockServer) -> RotationConfig {
	config_builder(server).build().expect("Test configuration should build.")
}

pub fn management_audience(server: &MockServer) -> String {
	format!("https://{}/api/v2/", server.address())
}

pub fn token_request(client_id: &str, client_secret: &str, audience: &str) -> Value {
	json!({
		"client_id": client_id,
		"client_secret": client_secret,
		"audience": audience,
		"grant_type": "client_credentials",
	})
}

pub fn token_response(access_token: &str) -> String {
	json!({ "access_token": access_token, "token_type": "Bearer", "expires_in": 86400 })
		.to_string()
}

pub fn patch_request(value: &str) -> Value {
	json!({ "secrets": [{ "name": "m2m_token", "value": value }] })
}
