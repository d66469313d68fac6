//! Rotate a machine-to-machine access token and republish it as an Auth0 Action secret.
//!
//! A run performs two OAuth 2.0 client-credentials exchanges against the tenant token
//! endpoint and PATCHes the first token into an Action's secrets, authorized by the
//! second (Management API) token. The [`login`] module carries the post-login hook that
//! copies authorization roles into custom claims.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod credential;
pub mod error;
pub mod handler;
pub mod http;
pub mod login;
pub mod obs;
pub mod rotation;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
