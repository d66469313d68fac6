// self
use crate::{
	_prelude::*,
	error::RotationError,
	obs::RotationStage,
	rotation::RotationReport,
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedStage<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedStage<F> = F;

/// A span builder used by rotation stages.
#[derive(Clone, Debug)]
pub struct StageSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl StageSpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(stage: RotationStage) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("m2m_rotator.stage", stage = stage.as_str());

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedStage<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Runs a synchronous step inside the span.
	pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
		#[cfg(feature = "tracing")]
		{
			self.span.in_scope(f)
		}
		#[cfg(not(feature = "tracing"))]
		{
			f()
		}
	}
}

/// Emits the single failure event for a rotation run.
///
/// Error messages are built from redaction-safe fields only, so the rendered chain is safe
/// to log as-is.
pub fn log_rotation_failure(err: &RotationError) {
	#[cfg(feature = "tracing")]
	{
		tracing::error!(
			stage = err.stage.as_str(),
			error_type = err.source.kind(),
			status = err.source.status(),
			error = %error_chain(err),
			"m2m token rotation failed"
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = err;
	}
}

/// Emits the success event for a rotation run.
pub fn log_rotation_success(report: &RotationReport) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(
			secret_name = %report.secret_name,
			action_id = %report.action_id,
			token_fingerprint = %report.token_fingerprint,
			expires_at = ?report.expires_at,
			"m2m token rotated"
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = report;
	}
}

#[cfg(feature = "tracing")]
fn error_chain(err: &dyn StdError) -> String {
	let mut rendered = err.to_string();
	let mut source = err.source();

	while let Some(cause) = source {
		let message = cause.to_string();

		if !rendered.contains(&message) {
			rendered.push_str(": ");
			rendered.push_str(&message);
		}

		source = cause.source();
	}

	rendered
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = StageSpan::new(RotationStage::ExchangeApi1);
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn in_scope_returns_step_result() {
		let span = StageSpan::new(RotationStage::LoadConfig);

		assert_eq!(span.in_scope(|| "loaded"), "loaded");
	}

	#[cfg(feature = "tracing")]
	#[test]
	fn error_chain_skips_repeated_messages() {
		let err = RotationError {
			stage: RotationStage::ResolveApi1,
			source: crate::error::ConfigError::MissingVar { key: "AUTH0_DOMAIN" }.into(),
		};
		let rendered = error_chain(&err);

		assert_eq!(
			rendered,
			"Rotation failed during resolve_api1: Missing required configuration value `AUTH0_DOMAIN`."
		);
	}
}
