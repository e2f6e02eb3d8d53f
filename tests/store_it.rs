#![cfg(all(feature = "test", feature = "reqwest"))]

// std
use std::{env, fs, process};
// crates.io
use time::macros;
// self
use request_preflight::{
	_preludet::*,
	auth::{CollectionUid, OAuth2Credentials},
	store::{FileStore, MemoryStore, TokenStore, TokenStoreKey},
};

fn collection(value: &str) -> CollectionUid {
	CollectionUid::new(value).expect("Collection identifier should be valid.")
}

fn credentials(token: &str) -> OAuth2Credentials {
	OAuth2Credentials::new(token, macros::datetime!(2025-01-01 00:00 UTC))
		.with_refresh_token(format!("{token}-refresh"))
		.with_expires_in(3600)
}

fn temp_path(name: &str) -> PathBuf {
	env::temp_dir().join(format!("request-preflight-{name}-{}.json", process::id()))
}

#[tokio::test]
async fn memory_store_isolates_keys() {
	let store = MemoryStore::default();
	let token_key = TokenStoreKey::new(collection("c1"), "https://idp.test/token", "credentials");
	let other_id = TokenStoreKey::new(collection("c1"), "https://idp.test/token", "admin");
	let other_collection =
		TokenStoreKey::new(collection("c2"), "https://idp.test/token", "credentials");

	store.set(token_key.clone(), credentials("a")).await.expect("Set should succeed.");
	store.set(other_id.clone(), credentials("b")).await.expect("Set should succeed.");
	store.set(other_collection.clone(), credentials("c")).await.expect("Set should succeed.");

	assert_eq!(
		store
			.list_collection(&collection("c1"))
			.await
			.expect("Listing should succeed.")
			.len(),
		2
	);
	assert_eq!(
		store.clear_collection(&collection("c1")).await.expect("Clearing should succeed."),
		2
	);
	assert!(store.get(&token_key).await.expect("Get should succeed.").is_none());
	assert!(store.get(&other_collection).await.expect("Get should succeed.").is_some());
}

#[tokio::test]
async fn memory_store_concurrent_writers_last_write_wins() {
	let store = Arc::new(MemoryStore::default());
	let key = TokenStoreKey::new(collection("c1"), "https://idp.test/token", "credentials");
	let mut handles = Vec::new();

	for i in 0..8 {
		let store = store.clone();
		let key = key.clone();

		handles.push(tokio::spawn(async move {
			store.set(key, credentials(&format!("token-{i}"))).await
		}));
	}
	for handle in handles {
		handle.await.expect("Writer task should not panic.").expect("Set should succeed.");
	}

	let stored = store
		.get(&key)
		.await
		.expect("Get should succeed.")
		.expect("One writer should have won.");

	assert!(stored.access_token.expose().starts_with("token-"));
	assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn file_store_survives_reopen() {
	let path = temp_path("reopen");
	let key = TokenStoreKey::new(collection("c1"), "https://idp.test/token", "credentials");

	{
		let store = FileStore::open(&path).expect("Store should open.");

		store.set(key.clone(), credentials("persisted")).await.expect("Set should succeed.");
	}

	let reopened = FileStore::open(&path).expect("Store should reopen.");
	let stored = reopened
		.get(&key)
		.await
		.expect("Get should succeed.")
		.expect("Credentials should survive a reopen.");

	assert_eq!(stored.access_token.expose(), "persisted");
	assert_eq!(stored.refresh_token.as_ref().map(|token| token.expose()), Some("persisted-refresh"));
	assert_eq!(stored.created_at, macros::datetime!(2025-01-01 00:00 UTC));

	reopened.clear(&key).await.expect("Clear should succeed.");

	let emptied = FileStore::open(&path).expect("Store should reopen.");

	assert!(emptied.get(&key).await.expect("Get should succeed.").is_none());

	let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn file_store_rejects_corrupt_snapshot() {
	let path = temp_path("corrupt");

	fs::write(&path, b"{not json").expect("Fixture file should be written.");

	assert!(FileStore::open(&path).is_err());

	let _ = fs::remove_file(&path);
}
