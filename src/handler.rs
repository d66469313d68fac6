//! Invocation entry point for the scheduled rotation.
//!
//! The scheduler hands over an opaque event/context pair and expects `{"statusCode": 200}`
//! on success. Failures are returned as a payload rather than raised, so
//! [`InvocationOutcome`] keeps an explicit discriminant next to the legacy JSON shape.

// crates.io
use serde_json::{Value, json};
// self
use crate::{
	_prelude::*,
	config::RotationConfig,
	error::RotationError,
	http::{RotationHttpClient, TransportErrorMapper},
	rotation::{RotationReport, Rotator},
};
#[cfg(feature = "reqwest")]
use crate::{
	config::SecretRef,
	credential::VaultSource,
	error::ConfigError,
	http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
	obs::{self, RotationStage, StageOutcome, StageSpan},
	rotation::ReqwestRotator,
};

/// Result of one invocation.
#[derive(Debug)]
pub enum InvocationOutcome {
	/// The token was rotated and published.
	Success(RotationReport),
	/// A stage failed; later stages did not run.
	Failure(RotationError),
}
impl InvocationOutcome {
	/// `true` when the rotation completed.
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success(_))
	}

	/// Renders the payload returned to the scheduler.
	///
	/// Success is `{"statusCode": 200}`. Failure is
	/// `{"errorType", "errorMessage", "stage", "status"}`, with `status` null when no HTTP
	/// response was received.
	pub fn into_legacy(self) -> Value {
		match self {
			Self::Success(_) => json!({ "statusCode": 200 }),
			Self::Failure(err) => json!({
				"errorType": err.source.kind(),
				"errorMessage": err.to_string(),
				"stage": err.stage,
				"status": err.source.status(),
			}),
		}
	}
}
impl From<std::result::Result<RotationReport, RotationError>> for InvocationOutcome {
	fn from(result: std::result::Result<RotationReport, RotationError>) -> Self {
		match result {
			Ok(report) => Self::Success(report),
			Err(err) => Self::Failure(err),
		}
	}
}

#[cfg(feature = "reqwest")]
/// Handler backed by the default reqwest transport.
pub type ReqwestRotationHandler = RotationHandler<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Binds a [`Rotator`] to the configuration it runs with.
pub struct RotationHandler<C, M>
where
	C: ?Sized + RotationHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Rotator executed per invocation.
	pub rotator: Rotator<C, M>,
	/// Configuration passed into every run.
	pub config: RotationConfig,
}
impl<C, M> RotationHandler<C, M>
where
	C: ?Sized + RotationHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Pairs `rotator` with `config`.
	pub fn new(rotator: Rotator<C, M>, config: RotationConfig) -> Self {
		Self { rotator, config }
	}

	/// Runs one rotation. `event` and `context` are accepted for signature compatibility
	/// and ignored.
	pub async fn handle(&self, event: Value, context: Value) -> InvocationOutcome {
		let _ = (event, context);

		self.rotator.rotate(&self.config).await.into()
	}
}
#[cfg(feature = "reqwest")]
impl RotationHandler<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Loads a handler from the process environment and runs one rotation.
	///
	/// Configuration failures come back as an [`InvocationOutcome::Failure`] at the
	/// `load_config` stage and are logged like any other failed run.
	pub async fn invoke(event: Value, context: Value) -> InvocationOutcome {
		Self::invoke_with(|key| std::env::var(key).ok(), event, context).await
	}

	/// Same as [`Self::invoke`], reading configuration through `lookup`.
	pub async fn invoke_with<F>(lookup: F, event: Value, context: Value) -> InvocationOutcome
	where
		F: Fn(&str) -> Option<String>,
	{
		match Self::from_lookup(lookup) {
			Ok(handler) => handler.handle(event, context).await,
			Err(err) => {
				obs::log_rotation_failure(&err);

				InvocationOutcome::Failure(err)
			},
		}
	}

	/// Builds a handler from the process environment.
	pub fn from_env() -> std::result::Result<Self, RotationError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Builds a handler from any key/value source.
	///
	/// When either client secret is configured as a reference, secrets resolve through a
	/// [`VaultSource`] read from the same source.
	pub fn from_lookup<F>(lookup: F) -> std::result::Result<Self, RotationError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let stage = RotationStage::LoadConfig;

		obs::record_stage_outcome(stage, StageOutcome::Attempt);

		let result = StageSpan::new(stage).in_scope(|| Self::load(&lookup));

		match &result {
			Ok(_) => obs::record_stage_outcome(stage, StageOutcome::Success),
			Err(_) => obs::record_stage_outcome(stage, StageOutcome::Failure),
		}

		result.map_err(|err| RotationError { stage, source: err.into() })
	}

	fn load<F>(lookup: &F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let config = RotationConfig::from_lookup(lookup)?;
		let mut rotator = ReqwestRotator::new(&config)?;
		let uses_references = [&config.api1.client_secret, &config.api2.client_secret]
			.into_iter()
			.any(|secret| matches!(secret, SecretRef::Reference(_)));

		if uses_references {
			let vault = VaultSource::from_lookup(lookup, config.request_timeout)?;

			rotator = rotator.with_credential_source(Arc::new(vault));
		}

		Ok(Self::new(rotator, config))
	}
}
impl<C, M> Debug for RotationHandler<C, M>
where
	C: ?Sized + RotationHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RotationHandler")
			.field("rotator", &self.rotator)
			.field("config", &self.config)
			.finish()
	}
}
