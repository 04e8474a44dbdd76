//! Identity-scoped token cache and its access protocol.
//!
//! [`TokenCache`] is the in-memory view of one user's cached tokens. It tracks a "changed" flag
//! that every mutation raises. [`SessionTokenCache`] keeps that view synchronized with a slot in
//! a [`SessionStore`](crate::session::SessionStore):
//!
//! - [`CacheNotifications::before_access`] reloads the slot, picking up writes made by other
//!   requests for the same identity.
//! - [`CacheNotifications::after_access`] flushes the view back when the access changed it.
//!
//! Token-acquisition code runs every cache use through [`access`], which brackets the closure
//! with both hooks.

pub mod item;
pub mod session_cache;

pub use item::*;
pub use session_cache::*;

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{ClientId, UserId},
	session::StoreError,
};

const BLOB_VERSION: u32 = 1;

/// Context handed to [`CacheNotifications`] hooks for one access window.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessArgs {
	/// Application performing the access, when known.
	pub client_id: Option<ClientId>,
	/// Resource being looked up, when known.
	pub resource: Option<String>,
	/// User whose tokens are being accessed, when known.
	pub user_id: Option<UserId>,
}
impl AccessArgs {
	/// Describes an access that targets a single cache key.
	pub fn for_key(key: &TokenCacheKey) -> Self {
		Self {
			client_id: Some(key.client_id.clone()),
			resource: Some(key.resource.clone()),
			user_id: key.user_id.clone(),
		}
	}
}

/// Hooks run around every cache access.
pub trait CacheNotifications
where
	Self: Send + Sync,
{
	/// Runs right before the cache is read or written.
	fn before_access(&self, args: &AccessArgs) -> Result<()>;

	/// Runs right after the cache was read or written.
	fn after_access(&self, args: &AccessArgs) -> Result<()>;
}

/// Runs `f` against `cache` inside one access window bracketed by `hooks`.
///
/// `after_access` runs only when `before_access` succeeded; an error from either hook is
/// returned instead of the closure's value.
pub fn access<H, T, F>(cache: &TokenCache, hooks: &H, args: &AccessArgs, f: F) -> Result<T>
where
	H: ?Sized + CacheNotifications,
	F: FnOnce(&TokenCache) -> T,
{
	hooks.before_access(args)?;

	let value = f(cache);

	hooks.after_access(args)?;

	Ok(value)
}

/// In-memory token cache for one identity.
#[derive(Debug, Default)]
pub struct TokenCache {
	items: RwLock<BTreeMap<TokenCacheKey, TokenCacheItem>>,
	has_state_changed: AtomicBool,
}
impl TokenCache {
	/// Returns `true` when a mutation happened since the flag was last cleared.
	pub fn has_state_changed(&self) -> bool {
		self.has_state_changed.load(Ordering::SeqCst)
	}

	/// Overrides the "changed" flag.
	pub fn set_has_state_changed(&self, changed: bool) {
		self.has_state_changed.store(changed, Ordering::SeqCst);
	}

	/// Inserts or replaces the entry for the item's key.
	pub fn insert(&self, item: TokenCacheItem) {
		self.items.write().insert(item.key.clone(), item);
		self.set_has_state_changed(true);
	}

	/// Returns a copy of the entry stored under `key`.
	pub fn find(&self, key: &TokenCacheKey) -> Option<TokenCacheItem> {
		self.items.read().get(key).cloned()
	}

	/// Returns every entry ordered by key.
	pub fn items(&self) -> Vec<TokenCacheItem> {
		self.items.read().values().cloned().collect()
	}

	/// Number of cached entries.
	pub fn len(&self) -> usize {
		self.items.read().len()
	}

	/// Returns `true` when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.items.read().is_empty()
	}

	/// Removes the entry under `key`, returning it when present.
	pub fn remove(&self, key: &TokenCacheKey) -> Option<TokenCacheItem> {
		let removed = self.items.write().remove(key);

		if removed.is_some() {
			self.set_has_state_changed(true);
		}

		removed
	}

	/// Drops every entry.
	pub fn clear(&self) {
		self.items.write().clear();
		self.set_has_state_changed(true);
	}

	/// Encodes every entry into a session blob.
	pub fn serialize(&self) -> Result<Vec<u8>, StoreError> {
		let guard = self.items.read();
		let blob = BlobRef { version: BLOB_VERSION, items: guard.values().collect() };

		serde_json::to_vec(&blob).map_err(|e| StoreError::Serialization {
			message: format!("Failed to encode token cache: {e}"),
		})
	}

	/// Replaces the in-memory entries with the contents of `blob`.
	///
	/// An absent or empty blob yields an empty cache. The "changed" flag is left untouched.
	pub fn deserialize(&self, blob: Option<&[u8]>) -> Result<(), StoreError> {
		let items = match blob {
			Some(bytes) if !bytes.is_empty() => decode_blob(bytes)?,
			_ => BTreeMap::new(),
		};

		*self.items.write() = items;

		Ok(())
	}
}

#[derive(Serialize)]
struct BlobRef<'a> {
	version: u32,
	items: Vec<&'a TokenCacheItem>,
}

#[derive(Deserialize)]
struct BlobOwned {
	version: u32,
	items: Vec<TokenCacheItem>,
}

fn decode_blob(bytes: &[u8]) -> Result<BTreeMap<TokenCacheKey, TokenCacheItem>, StoreError> {
	let blob: BlobOwned = serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization {
		message: format!("Failed to decode token cache: {e}"),
	})?;

	if blob.version != BLOB_VERSION {
		return Err(StoreError::Serialization {
			message: format!("Unsupported token cache version {}", blob.version),
		});
	}

	Ok(blob.items.into_iter().map(|item| (item.key.clone(), item)).collect())
}
