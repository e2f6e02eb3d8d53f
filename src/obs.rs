//! Optional observability helpers for credential flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `request_preflight.flow` with the `flow`
//!   (grant or refresh), `collection`, `credentials_id` and `endpoint` fields.
//! - Enable `metrics` to increment the `request_preflight_flow_total` counter for every
//!   attempt, cache hit, stale return, success and failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, auth::OAuth2Grant};

/// Credential flow kinds observed by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Authorization Code grant, with or without PKCE.
	AuthorizationCode,
	/// Client Credentials grant.
	ClientCredentials,
	/// Resource Owner Password grant.
	Password,
	/// Implicit grant.
	Implicit,
	/// Refresh token exchange.
	Refresh,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::AuthorizationCode => "authorization_code",
			FlowKind::ClientCredentials => "client_credentials",
			FlowKind::Password => "password",
			FlowKind::Implicit => "implicit",
			FlowKind::Refresh => "refresh",
		}
	}
}
impl From<&OAuth2Grant> for FlowKind {
	fn from(grant: &OAuth2Grant) -> Self {
		match grant {
			OAuth2Grant::AuthorizationCode(_) => Self::AuthorizationCode,
			OAuth2Grant::ClientCredentials(_) => Self::ClientCredentials,
			OAuth2Grant::Password(_) => Self::Password,
			OAuth2Grant::Implicit(_) => Self::Implicit,
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a credential operation.
	Attempt,
	/// A cached credential was returned without network traffic.
	CacheHit,
	/// An expired credential was returned because policy forbids fetching.
	Stale,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::CacheHit => "cache_hit",
			FlowOutcome::Stale => "stale",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
