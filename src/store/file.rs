//! File-backed [`TokenStore`] that survives application restarts.

// std
use std::{
	fs::{self, File},
	io::Write,
};
// self
use crate::{
	_prelude::*,
	auth::{CollectionUid, OAuth2Credentials},
	store::{StoreError, StoreFuture, TokenStore, TokenStoreKey},
};

type Snapshot = HashMap<TokenStoreKey, OAuth2Credentials>;

/// Persists credentials to a JSON file after each mutation.
///
/// Writes go to a sibling `.tmp` file that is synced and renamed over the snapshot, so a crash
/// never leaves a half-written file behind.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Snapshot>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the snapshot file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
		if !path.exists() {
			return Ok(HashMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(HashMap::new());
		}

		let entries: Vec<(TokenStoreKey, OAuth2Credentials)> =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(entries.into_iter().collect())
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	/// Applies `edit` to a copy of the map and publishes the copy only once it is on disk.
	///
	/// `edit` returns its result plus whether anything changed; unchanged maps skip the write.
	fn commit<R>(&self, edit: impl FnOnce(&mut Snapshot) -> (R, bool)) -> Result<R, StoreError> {
		let mut guard = self.inner.write();
		let mut next = guard.clone();
		let (out, changed) = edit(&mut next);

		if changed {
			self.persist_locked(&next)?;

			*guard = next;
		}

		Ok(out)
	}

	fn persist_locked(&self, contents: &Snapshot) -> Result<(), StoreError> {
		let mut snapshot: Vec<_> = contents.iter().collect();

		snapshot.sort_by(|a, b| a.0.cmp(b.0));

		let serialized =
			serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl TokenStore for FileStore {
	fn get<'a>(&'a self, key: &'a TokenStoreKey) -> StoreFuture<'a, Option<OAuth2Credentials>> {
		Box::pin(async move { Ok(self.inner.read().get(key).cloned()) })
	}

	fn set(&self, key: TokenStoreKey, credentials: OAuth2Credentials) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.commit(|map| {
				map.insert(key, credentials);

				((), true)
			})
		})
	}

	fn clear<'a>(&'a self, key: &'a TokenStoreKey) -> StoreFuture<'a, Option<OAuth2Credentials>> {
		Box::pin(async move {
			self.commit(|map| {
				let removed = map.remove(key);
				let changed = removed.is_some();

				(removed, changed)
			})
		})
	}

	fn list_collection<'a>(
		&'a self,
		collection_uid: &'a CollectionUid,
	) -> StoreFuture<'a, Vec<(TokenStoreKey, OAuth2Credentials)>> {
		Box::pin(async move {
			let mut entries: Vec<_> = self
				.inner
				.read()
				.iter()
				.filter(|(key, _)| &key.collection_uid == collection_uid)
				.map(|(key, credentials)| (key.clone(), credentials.clone()))
				.collect();

			entries.sort_by(|a, b| a.0.cmp(&b.0));

			Ok(entries)
		})
	}

	fn clear_collection<'a>(&'a self, collection_uid: &'a CollectionUid) -> StoreFuture<'a, usize> {
		Box::pin(async move {
			self.commit(|map| {
				let before = map.len();

				map.retain(|key, _| &key.collection_uid != collection_uid);

				let removed = before - map.len();

				(removed, removed > 0)
			})
		})
	}
}
