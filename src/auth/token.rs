//! Token value types.

pub mod response;
pub mod secret;
