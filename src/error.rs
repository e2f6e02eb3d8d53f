//! Crate-level error types shared across preparation, credential flows, and stores.

// self
use crate::{_prelude::*, flows::DebugTrail};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// OAuth2 configuration problems (a missing token URL, client id, and so on) are not
/// represented here. They travel inside [`CredentialsOutcome`](crate::flows::CredentialsOutcome)
/// so one malformed auth block fails one request instead of the caller's pipeline.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS) outside a token exchange.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The authorization surface rejected or was closed before completing.
	#[error(transparent)]
	Authorization(#[from] crate::authorize::AuthorizeError),

	/// A client certificate, key, or CA bundle could not be read.
	#[error("Unable to read certificate material at {}.", path.display())]
	Certificate {
		/// Fully resolved file path.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// The token endpoint could not be reached.
	///
	/// The debug trail still holds every request made up to and including the failing one.
	#[error("Token endpoint call failed: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// Requests and responses recorded before the failure surfaced.
		debug: Box<DebugTrail>,
		/// Underlying transport failure.
		#[source]
		source: TransportError,
	},
	/// The request item does not exist in the collection tree.
	#[error("Item `{uid}` was not found in collection `{collection}`.")]
	ItemNotFound {
		/// Collection identifier.
		collection: String,
		/// Missing item identifier.
		uid: String,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A configured URL cannot be parsed.
	#[error("The {field} is not a valid URL.")]
	InvalidUrl {
		/// Human-readable field label.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Preferences or collection settings could not be decoded.
	#[error("Settings could not be decoded.")]
	Settings(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// Client identity material could not be decoded or decrypted.
	#[error("The {kind} client identity could not be decoded; check the file and its passphrase.")]
	InvalidIdentity {
		/// Identity kind label.
		kind: &'static str,
		/// Decoder failure.
		#[source]
		source: openssl::error::ErrorStack,
	},
	/// A PKCS#12 archive lacks a certificate or private key.
	#[error("The {kind} client identity contains no {missing}.")]
	IncompleteIdentity {
		/// Identity kind label.
		kind: &'static str,
		/// `certificate` or `private key`.
		missing: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
	/// The client for this call could not be prepared from its transport settings.
	#[error("Token endpoint client could not be prepared.")]
	Setup(#[from] ConfigError),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
