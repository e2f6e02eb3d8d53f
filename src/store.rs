//! Storage contracts and built-in stores for OAuth2 credentials.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CollectionUid, OAuth2Credentials},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Credential cache keyed by [`TokenStoreKey`].
///
/// Reads and writes of one key must be atomic with respect to each other. Different keys are
/// independent. Concurrent writers to the same key are not coordinated; the last write wins.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Fetches the credentials stored under `key`.
	fn get<'a>(&'a self, key: &'a TokenStoreKey) -> StoreFuture<'a, Option<OAuth2Credentials>>;

	/// Stores or replaces the credentials under `key`.
	fn set(&self, key: TokenStoreKey, credentials: OAuth2Credentials) -> StoreFuture<'_, ()>;

	/// Removes the credentials under `key`, returning them.
	fn clear<'a>(&'a self, key: &'a TokenStoreKey) -> StoreFuture<'a, Option<OAuth2Credentials>>;

	/// Lists every entry of a collection.
	fn list_collection<'a>(
		&'a self,
		collection_uid: &'a CollectionUid,
	) -> StoreFuture<'a, Vec<(TokenStoreKey, OAuth2Credentials)>>;

	/// Removes every entry of a collection, returning how many were dropped.
	fn clear_collection<'a>(&'a self, collection_uid: &'a CollectionUid) -> StoreFuture<'a, usize>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Cache slot identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStoreKey {
	/// Owning collection.
	pub collection_uid: CollectionUid,
	/// Token endpoint URL (authorization URL for the implicit grant).
	pub url: String,
	/// Caller-chosen credentials identifier.
	pub credentials_id: String,
}
impl TokenStoreKey {
	/// Builds a key.
	pub fn new(
		collection_uid: CollectionUid,
		url: impl Into<String>,
		credentials_id: impl Into<String>,
	) -> Self {
		Self { collection_uid, url: url.into(), credentials_id: credentials_id.into() }
	}
}
impl Display for TokenStoreKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}|{}|{}", self.collection_uid, self.url, self.credentials_id)
	}
}
