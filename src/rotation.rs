//! M2M token rotation: two client-credentials exchanges followed by one secret patch.
//!
//! [`Rotator::rotate`] runs the stages strictly in order:
//!
//! 1. resolve the API1 client secret and exchange it for token A;
//! 2. resolve the Management API client secret and exchange it for token B against the
//!    tenant's `/api/v2/` audience;
//! 3. PATCH `m2m_token = token A` into the configured Action, authorized by token B.
//!
//! Any failure stops the run. Later stages never start, so token A is dropped unpublished
//! when step 2 fails. Each stage runs inside a [`StageSpan`] and records
//! [`StageOutcome`]s; the run as a whole logs exactly once at this boundary.

pub mod exchange;
pub mod publish;

pub use exchange::*;
pub use publish::*;

// self
use crate::{
	_prelude::*,
	auth::{ActionId, ApiSlot},
	config::{M2M_SECRET_NAME, RotationConfig},
	credential::{self, CredentialSource, DirectSource},
	error::{self, RotationError},
	http::{RotationHttpClient, TransportErrorMapper},
	obs::{self, RotationStage, StageOutcome, StageSpan},
};
#[cfg(feature = "reqwest")]
use crate::{
	error::ConfigError,
	http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
};

pub(crate) const JSON_MEDIA_TYPE: &str = "application/json";

/// Outcome of one rotation run.
pub type RotationResult = std::result::Result<RotationReport, RotationError>;

#[cfg(feature = "reqwest")]
/// Rotator specialized for the crate's default reqwest transport stack.
pub type ReqwestRotator = Rotator<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Redaction-safe summary of a successful rotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RotationReport {
	/// Name of the Action secret that was written.
	pub secret_name: String,
	/// Action that received the secret.
	pub action_id: ActionId,
	/// Fingerprint of the published token.
	pub token_fingerprint: String,
	/// Expiry of the published token, when the provider reported a lifetime.
	pub expires_at: Option<OffsetDateTime>,
}

/// Sequences the two exchanges and the publish for one rotation run.
///
/// The rotator holds no per-run state; configuration is passed into every
/// [`rotate`](Self::rotate) call.
pub struct Rotator<C, M>
where
	C: ?Sized + RotationHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Client-credentials exchanger shared by both exchanges.
	pub exchanger: TokenExchanger<C, M>,
	/// Publisher for the Action secret.
	pub publisher: SecretPublisher<C, M>,
	/// Resolves client secrets configured as references.
	pub credential_source: Arc<dyn CredentialSource>,
}
impl<C, M> Rotator<C, M>
where
	C: ?Sized + RotationHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a rotator that reuses the caller-provided transport + mapper pair.
	///
	/// Secrets resolve through [`DirectSource`] until
	/// [`with_credential_source`](Self::with_credential_source) replaces it.
	pub fn with_http_client(http_client: impl Into<Arc<C>>, mapper: impl Into<Arc<M>>) -> Self {
		let http_client = http_client.into();
		let mapper = mapper.into();

		Self {
			exchanger: TokenExchanger::new(Arc::clone(&http_client), Arc::clone(&mapper)),
			publisher: SecretPublisher::new(http_client, mapper),
			credential_source: Arc::new(DirectSource),
		}
	}

	/// Replaces the source used for secret-store references.
	pub fn with_credential_source(mut self, source: Arc<dyn CredentialSource>) -> Self {
		self.credential_source = source;

		self
	}

	/// Runs one rotation against `config`.
	pub async fn rotate(&self, config: &RotationConfig) -> RotationResult {
		let result = self.run(config).await;

		match &result {
			Ok(report) => obs::log_rotation_success(report),
			Err(err) => obs::log_rotation_failure(err),
		}

		result
	}

	async fn run(&self, config: &RotationConfig) -> RotationResult {
		let token_endpoint = config.server.token_endpoint();
		let api1 = run_stage(RotationStage::ResolveApi1, async {
			credential::resolve_credentials(self.credential_source.as_ref(), config, ApiSlot::Api1)
				.await
				.map_err(Error::from)
		})
		.await?;
		let token_a = run_stage(
			RotationStage::ExchangeApi1,
			self.exchanger.exchange(&api1, &token_endpoint),
		)
		.await?;
		let api2 = run_stage(RotationStage::ResolveApi2, async {
			credential::resolve_credentials(self.credential_source.as_ref(), config, ApiSlot::Api2)
				.await
				.map_err(Error::from)
		})
		.await?;
		let token_b = run_stage(
			RotationStage::ExchangeApi2,
			self.exchanger.exchange(&api2, &token_endpoint),
		)
		.await?;

		run_stage(
			RotationStage::Publish,
			self.publisher.publish(
				&config.action_endpoint(),
				&token_b.access_token,
				M2M_SECRET_NAME,
				&token_a.access_token,
			),
		)
		.await?;

		Ok(RotationReport {
			secret_name: M2M_SECRET_NAME.into(),
			action_id: config.action_id.clone(),
			token_fingerprint: token_a.access_token.fingerprint(),
			expires_at: token_a.expires_at(),
		})
	}
}
#[cfg(feature = "reqwest")]
impl Rotator<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a rotator whose reqwest client bounds every call by `config.request_timeout`.
	pub fn new(config: &RotationConfig) -> Result<Self, ConfigError> {
		let http_client = ReqwestHttpClient::with_timeout(config.request_timeout)?;

		Ok(Self::with_http_client(http_client, ReqwestTransportErrorMapper))
	}
}
impl<C, M> Clone for Rotator<C, M>
where
	C: ?Sized + RotationHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			exchanger: self.exchanger.clone(),
			publisher: self.publisher.clone(),
			credential_source: Arc::clone(&self.credential_source),
		}
	}
}
impl<C, M> Debug for Rotator<C, M>
where
	C: ?Sized + RotationHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Rotator")
			.field("exchanger", &self.exchanger)
			.field("publisher", &self.publisher)
			.finish_non_exhaustive()
	}
}

async fn run_stage<T, F>(stage: RotationStage, fut: F) -> std::result::Result<T, RotationError>
where
	F: Future<Output = Result<T>>,
{
	let span = StageSpan::new(stage);

	obs::record_stage_outcome(stage, StageOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => obs::record_stage_outcome(stage, StageOutcome::Success),
		Err(_) => obs::record_stage_outcome(stage, StageOutcome::Failure),
	}

	result.map_err(|source| RotationError { stage, source })
}

/// Lossy UTF-8 preview of a response body with `secrets` scrubbed.
pub(crate) fn body_preview(body: &[u8], secrets: &[&str]) -> String {
	let preview = error::scrub(&String::from_utf8_lossy(body), secrets);

	if preview.is_empty() { "empty response body".into() } else { preview }
}
