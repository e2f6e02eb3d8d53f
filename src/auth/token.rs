//! Token material and its lifecycle.

pub mod credentials;
pub mod secret;
