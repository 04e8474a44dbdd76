#![cfg(all(feature = "test", feature = "reqwest"))]

// std
use std::{env, fs, path::PathBuf, process, sync::Barrier, thread};
// self
use calendar_bridge::{
	_preludet::*,
	auth::UserId,
	cache::{AccessArgs, SessionLock, SessionTokenCache, TokenCache, TokenCacheKey},
	session::{FileSessionStore, MemorySessionStore, SessionStore, StoreError},
	token::{SessionCacheTokenProvider, TokenProvider},
};

#[derive(Default)]
struct RecordingStore {
	inner: MemorySessionStore,
	writes: Mutex<Vec<Vec<u8>>>,
}
impl SessionStore for RecordingStore {
	fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
		self.inner.get(key)
	}

	fn set(&self, key: &str, blob: Vec<u8>) -> Result<(), StoreError> {
		self.writes.lock().push(blob.clone());
		self.inner.set(key, blob)
	}

	fn remove(&self, key: &str) -> Result<(), StoreError> {
		self.inner.remove(key)
	}
}

fn decode(blob: &[u8]) -> TokenCache {
	let cache = TokenCache::default();

	cache.deserialize(Some(blob)).expect("Stored blob should decode.");

	cache
}

fn temp_path(tag: &str) -> PathBuf {
	let unique = format!(
		"calendar_bridge_session_it_{tag}_{}_{}.json",
		process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos(),
	);

	env::temp_dir().join(unique)
}

#[test]
fn concurrent_writers_leave_last_flush_in_slot() {
	const WRITERS: usize = 8;

	let user = "user-concurrent";
	let key = test_cache_key(user);
	let store = Arc::new(RecordingStore::default());
	let lock = SessionLock::new();
	let barrier = Barrier::new(WRITERS);

	thread::scope(|scope| {
		for writer in 0..WRITERS {
			let store: Arc<dyn SessionStore> = store.clone();
			let lock = lock.clone();
			let key = key.clone();
			let barrier = &barrier;

			scope.spawn(move || {
				let user_id = UserId::new(user).expect("User fixture should be valid.");
				let cache = SessionTokenCache::new(user_id, store, lock)
					.expect("Writer cache should load.");
				let access = format!("writer-{writer}");
				let entry = test_cache_item(key.clone(), &access, Duration::hours(1));

				barrier.wait();
				cache
					.access(&AccessArgs::for_key(&key), |view| view.insert(entry))
					.expect("Writer access should succeed.");
			});
		}
	});

	let writes = store.writes.lock();
	let slot = store
		.get(&format!("{user}_TokenCache"))
		.expect("Slot read should succeed.")
		.expect("Slot should exist after the writers flushed.");

	assert_eq!(writes.len(), WRITERS, "Every changed access must flush exactly once.");
	assert_eq!(writes.last(), Some(&slot), "The slot must hold the last flushed blob.");

	let token = decode(&slot)
		.find(&key)
		.expect("The last flush should carry its writer's entry.")
		.access_token;

	assert!(token.expose().starts_with("writer-"));
}

#[test]
fn fresh_instance_sees_persisted_entries() {
	let user = "user-round-trip";
	let key = test_cache_key(user);
	let (cache, store) = build_session_cache(user);
	let entry = test_cache_item(key.clone(), "persisted", Duration::hours(1));

	cache
		.access(&AccessArgs::for_key(&key), |view| view.insert(entry.clone()))
		.expect("Mutating access should succeed.");

	let user_id = UserId::new(user).expect("User fixture should be valid.");
	let reopened = SessionTokenCache::new(user_id, store, SessionLock::new())
		.expect("Second instance should load the slot.");

	assert_eq!(reopened.cache().find(&key), Some(entry));
}

#[test]
fn clear_then_load_yields_empty_cache() {
	let user = "user-clear";
	let key = test_cache_key(user);
	let (cache, store) = build_session_cache(user);

	cache
		.access(&AccessArgs::for_key(&key), |view| {
			view.insert(test_cache_item(key.clone(), "short-lived", Duration::hours(1)))
		})
		.expect("Mutating access should succeed.");

	assert!(store.contains(cache.cache_id()));

	cache.clear().expect("Clear should succeed.");
	cache.load().expect("Load after clear should succeed.");

	assert!(cache.cache().is_empty());
	assert!(!store.contains(cache.cache_id()), "Clear must remove the slot entirely.");

	cache
		.access(&AccessArgs::for_key(&key), |view| view.len())
		.expect("Read-only access should succeed.");

	assert!(!store.contains(cache.cache_id()), "An unchanged access must not recreate the slot.");
}

#[test]
fn delete_item_only_drops_the_target_entry() {
	let user = "user-delete";
	let outlook = test_cache_key(user);
	let graph =
		TokenCacheKey::new(TEST_AUTHORITY, outlook.client_id.clone(), "https://graph.microsoft.com/")
			.for_user(UserId::new(user).expect("User fixture should be valid."));
	let (cache, store) = build_session_cache(user);
	let doomed = test_cache_item(outlook.clone(), "outlook", Duration::hours(1));

	cache
		.access(&AccessArgs::for_key(&outlook), |view| {
			view.insert(doomed.clone());
			view.insert(test_cache_item(graph.clone(), "graph", Duration::hours(1)));
		})
		.expect("Mutating access should succeed.");
	cache.delete_item(&doomed).expect("Delete should succeed.");

	let blob = store
		.get(cache.cache_id())
		.expect("Slot read should succeed.")
		.expect("Slot should remain after deleting one entry.");
	let stored = decode(&blob);

	assert!(stored.find(&outlook).is_none());
	assert!(stored.find(&graph).is_some());
}

#[test]
fn file_store_backs_a_session_cache() {
	let path = temp_path("cache");
	let user = "user-file";
	let key = test_cache_key(user);
	let entry = test_cache_item(key.clone(), "on-disk", Duration::hours(1));

	{
		let store = FileSessionStore::open(&path).expect("File store should open.");
		let user_id = UserId::new(user).expect("User fixture should be valid.");
		let cache = SessionTokenCache::new(user_id, Arc::new(store), SessionLock::new())
			.expect("Cache should load from an empty file store.");

		cache
			.access(&AccessArgs::for_key(&key), |view| view.insert(entry.clone()))
			.expect("Mutating access should succeed.");
	}

	let store = FileSessionStore::open(&path).expect("File store should reopen.");
	let user_id = UserId::new(user).expect("User fixture should be valid.");
	let cache = SessionTokenCache::new(user_id, Arc::new(store), SessionLock::new())
		.expect("Cache should load from the snapshot.");

	assert_eq!(cache.cache().find(&key), Some(entry));

	fs::remove_file(&path).unwrap_or_else(|e| {
		panic!("Failed to remove temporary session snapshot {}: {e}", path.display())
	});
}

#[tokio::test]
async fn provider_hands_out_valid_cached_token() {
	let user = "user-provider";
	let key = test_cache_key(user);
	let (cache, _store) = build_session_cache(user);

	cache
		.access(&AccessArgs::for_key(&key), |view| {
			view.insert(test_cache_item(key.clone(), "cached-access", Duration::hours(1)))
		})
		.expect("Seeding access should succeed.");

	let provider = SessionCacheTokenProvider::new(cache, key);
	let token = provider.access_token().await.expect("Cached token should be handed out.");

	assert_eq!(token.expose(), "cached-access");
}

#[tokio::test]
async fn provider_evicts_tokens_inside_the_skew() {
	let user = "user-expiring";
	let key = test_cache_key(user);
	let (cache, store) = build_session_cache(user);

	cache
		.access(&AccessArgs::for_key(&key), |view| {
			view.insert(test_cache_item(key.clone(), "almost-expired", Duration::minutes(2)))
		})
		.expect("Seeding access should succeed.");

	let relaxed = SessionCacheTokenProvider::new(cache.clone(), key.clone())
		.with_expiry_skew(Duration::ZERO);

	relaxed.access_token().await.expect("Without skew the token is still valid.");

	let provider = SessionCacheTokenProvider::new(cache.clone(), key.clone());
	let err = provider.access_token().await.expect_err("Token inside the skew must be rejected.");

	assert!(matches!(err, Error::TokenUnavailable { .. }));
	assert!(cache.cache().find(&key).is_none());

	let blob = store
		.get(cache.cache_id())
		.expect("Slot read should succeed.")
		.expect("Eviction should be flushed, not drop the slot.");

	assert!(decode(&blob).is_empty(), "The eviction must reach the session store.");

	let err = provider.access_token().await.expect_err("Evicted token must stay gone.");

	assert!(matches!(err, Error::TokenUnavailable { .. }));
}
