//! Transport error classification.

// crates.io
use oauth2::HttpClientError;
// self
use crate::{_prelude::*, error::TransportError, http::ResponseMetadata};

/// Maps HTTP transport failures into [`TransportError`] values.
///
/// The exchanger and publisher attach their own context afterwards, so the mapper only
/// decides what kind of transport failure occurred.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> TransportError;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> TransportError {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(*inner),
			HttpClientError::Http(inner) => TransportError::network(inner),
			HttpClientError::Io(inner) => TransportError::Io(inner),
			HttpClientError::Other(message) => TransportError::Other { message },
			_ => map_unknown_transport_error(meta),
		}
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError) -> TransportError {
	if err.is_timeout() {
		return TransportError::TimedOut;
	}

	TransportError::from(err)
}

#[cfg(feature = "reqwest")]
fn map_unknown_transport_error(meta: Option<&ResponseMetadata>) -> TransportError {
	let message = match meta.and_then(|value| value.status) {
		Some(status) => format!("unrecognized client failure after HTTP {status}"),
		None => "unrecognized client failure".into(),
	};

	TransportError::Other { message }
}

#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
