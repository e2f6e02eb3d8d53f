//! Thread-safe in-memory [`TokenStore`] for a single application session and for tests.

// self
use crate::{
	_prelude::*,
	auth::{CollectionUid, OAuth2Credentials},
	store::{StoreFuture, TokenStore, TokenStoreKey},
};

type StoreMap = Arc<RwLock<HashMap<TokenStoreKey, OAuth2Credentials>>>;

/// Process-local credential cache.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of stored entries across all collections.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn list_now(map: StoreMap, collection_uid: &CollectionUid) -> Vec<(TokenStoreKey, OAuth2Credentials)> {
		let mut entries: Vec<_> = map
			.read()
			.iter()
			.filter(|(key, _)| &key.collection_uid == collection_uid)
			.map(|(key, credentials)| (key.clone(), credentials.clone()))
			.collect();

		entries.sort_by(|a, b| a.0.cmp(&b.0));

		entries
	}

	fn clear_collection_now(map: StoreMap, collection_uid: &CollectionUid) -> usize {
		let mut guard = map.write();
		let before = guard.len();

		guard.retain(|key, _| &key.collection_uid != collection_uid);

		before - guard.len()
	}
}
impl TokenStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a TokenStoreKey) -> StoreFuture<'a, Option<OAuth2Credentials>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(key).cloned()) })
	}

	fn set(&self, key: TokenStoreKey, credentials: OAuth2Credentials) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(key, credentials);

			Ok(())
		})
	}

	fn clear<'a>(&'a self, key: &'a TokenStoreKey) -> StoreFuture<'a, Option<OAuth2Credentials>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.write().remove(key)) })
	}

	fn list_collection<'a>(
		&'a self,
		collection_uid: &'a CollectionUid,
	) -> StoreFuture<'a, Vec<(TokenStoreKey, OAuth2Credentials)>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::list_now(map, collection_uid)) })
	}

	fn clear_collection<'a>(&'a self, collection_uid: &'a CollectionUid) -> StoreFuture<'a, usize> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::clear_collection_now(map, collection_uid)) })
	}
}
