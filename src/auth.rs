//! Authorization configuration, OAuth2 credentials, and tree identifiers.

pub mod config;
pub mod id;
pub mod grant;
pub mod token;

pub use config::*;
pub use id::*;
pub use grant::*;
pub use token::{credentials::*, secret::*};
