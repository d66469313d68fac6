//! Optional observability helpers for rotation stages.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `m2m_rotator.stage` with the `stage`
//!   field, plus one `error!` event per failed run and one `info!` event per successful run.
//! - Enable `metrics` to increment the `m2m_rotator_stage_total` counter for every
//!   attempt/success/failure, labeled by `stage` + `outcome`.
//!
//! Token values never reach either backend; events carry [`fingerprint`] prefixes only.
//!
//! [`fingerprint`]: crate::auth::TokenSecret::fingerprint

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Rotation stages, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationStage {
	/// Reading configuration and wiring the secret store.
	LoadConfig,
	/// Resolving the API1 client secret.
	ResolveApi1,
	/// Client-credentials exchange producing the token to publish.
	ExchangeApi1,
	/// Resolving the Management API client secret.
	ResolveApi2,
	/// Client-credentials exchange producing the Management API bearer token.
	ExchangeApi2,
	/// Secret patch against the Action endpoint.
	Publish,
}
impl RotationStage {
	/// Every stage in execution order.
	pub const ALL: [Self; 6] = [
		Self::LoadConfig,
		Self::ResolveApi1,
		Self::ExchangeApi1,
		Self::ResolveApi2,
		Self::ExchangeApi2,
		Self::Publish,
	];

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RotationStage::LoadConfig => "load_config",
			RotationStage::ResolveApi1 => "resolve_api1",
			RotationStage::ExchangeApi1 => "exchange_api1",
			RotationStage::ResolveApi2 => "resolve_api2",
			RotationStage::ExchangeApi2 => "exchange_api2",
			RotationStage::Publish => "publish",
		}
	}
}
impl Display for RotationStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
