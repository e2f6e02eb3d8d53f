//! Request preparation for hierarchical API collections: inherited headers, variables, scripts
//! and auth, layered `{{variable}}` interpolation, and an OAuth 2.0 credential lifecycle with
//! TLS client-certificate and proxy resolution.

#![deny(clippy::all, unused_crate_dependencies)]
#![warn(missing_docs)]

pub mod auth;
pub mod authorize;
pub mod error;
pub mod flows;
pub mod http;
pub mod interpolate;
pub mod network;
pub mod obs;
pub mod preferences;
pub mod prepare;
pub mod resolve;
pub mod store;
pub mod tree;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		authorize::{AuthorizeError, AuthorizeFuture, AuthorizeRequest, AuthorizeResponse, Authorizer},
		flows::OAuth2Engine,
		http::ReqwestHttpClient,
		store::{MemoryStore, TokenStore},
	};

	/// Engine type alias used by reqwest-backed integration tests.
	pub type ReqwestTestEngine = OAuth2Engine<ReqwestHttpClient>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs an [`OAuth2Engine`] backed by an in-memory store and the provided authorizer.
	pub fn build_reqwest_test_engine(
		authorizer: Arc<dyn Authorizer>,
	) -> (ReqwestTestEngine, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let engine = OAuth2Engine::with_http_client(store, authorizer, test_reqwest_http_client());

		(engine, store_backend)
	}

	/// Authorizer fake that replays scripted responses and records every request it receives.
	#[derive(Debug, Default)]
	pub struct ScriptedAuthorizer {
		responses: Mutex<Vec<Result<AuthorizeResponse, AuthorizeError>>>,
		requests: Mutex<Vec<AuthorizeRequest>>,
	}
	impl ScriptedAuthorizer {
		/// Queues a response; responses are served in insertion order.
		pub fn push(&self, response: Result<AuthorizeResponse, AuthorizeError>) {
			self.responses.lock().push(response);
		}

		/// Returns every authorize request seen so far.
		pub fn requests(&self) -> Vec<AuthorizeRequest> {
			self.requests.lock().clone()
		}
	}
	impl Authorizer for ScriptedAuthorizer {
		fn authorize(&self, request: AuthorizeRequest) -> AuthorizeFuture<'_> {
			self.requests.lock().push(request);

			let next = {
				let mut queue = self.responses.lock();

				if queue.is_empty() { None } else { Some(queue.remove(0)) }
			};

			Box::pin(async move { next.unwrap_or(Err(AuthorizeError::Cancelled)) })
		}
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		path::{Path, PathBuf},
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map as JsonMap, Value as JsonValue};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
