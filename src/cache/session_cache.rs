//! Token cache mirrored into a per-user session slot.

// std
use std::sync::LazyLock;
// crates.io
use parking_lot::{RwLockReadGuard, RwLockWriteGuard};
// self
use crate::{
	_prelude::*,
	auth::UserId,
	cache::{self, AccessArgs, CacheNotifications, TokenCache, TokenCacheItem},
	obs::{self, OpKind, OpOutcome, OpSpan},
	session::SessionStore,
};

static GLOBAL_SESSION_LOCK: LazyLock<SessionLock> = LazyLock::new(SessionLock::new);

/// Reader/writer lock guarding session token slots.
///
/// Clones share the same lock. Every [`SessionTokenCache`] built from clones of one handle is
/// serialized against the others: loads run concurrently, a persist excludes loads and other
/// persists. The lock is not re-entrant.
#[derive(Clone, Debug, Default)]
pub struct SessionLock(Arc<RwLock<()>>);
impl SessionLock {
	/// Creates an independent lock.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the process-wide lock shared by every caller of this function.
	pub fn global() -> Self {
		GLOBAL_SESSION_LOCK.clone()
	}

	/// Returns `true` when both handles guard with the same lock.
	pub fn shares_with(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}

	fn read(&self) -> RwLockReadGuard<'_, ()> {
		self.0.read()
	}

	fn write(&self) -> RwLockWriteGuard<'_, ()> {
		self.0.write()
	}
}

/// [`TokenCache`] for one identity, reloaded from and flushed to its session slot.
pub struct SessionTokenCache {
	user_id: UserId,
	cache_id: String,
	cache: TokenCache,
	store: Arc<dyn SessionStore>,
	lock: SessionLock,
}
impl SessionTokenCache {
	/// Creates the cache for `user_id` and loads whatever its session slot already holds.
	pub fn new(user_id: UserId, store: Arc<dyn SessionStore>, lock: SessionLock) -> Result<Self> {
		let cache_id = user_id.token_cache_key();
		let this = Self { user_id, cache_id, cache: TokenCache::default(), store, lock };

		this.load()?;

		Ok(this)
	}

	/// Identity the cache belongs to.
	pub fn user_id(&self) -> &UserId {
		&self.user_id
	}

	/// Session slot key (`<userId>_TokenCache`).
	pub fn cache_id(&self) -> &str {
		&self.cache_id
	}

	/// In-memory view; mutate it inside [`SessionTokenCache::access`] so changes get flushed.
	pub fn cache(&self) -> &TokenCache {
		&self.cache
	}

	/// Lock handle the cache synchronizes on.
	pub fn lock(&self) -> &SessionLock {
		&self.lock
	}

	/// Reloads the in-memory view from the session slot under the shared lock.
	///
	/// A missing slot produces an empty cache. Safe to call any number of times.
	pub fn load(&self) -> Result<()> {
		const KIND: OpKind = OpKind::CacheLoad;

		let _span = OpSpan::new(KIND, "load").entered();

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = {
			let _shared = self.lock.read();

			self.store
				.get(&self.cache_id)
				.and_then(|blob| self.cache.deserialize(blob.as_deref()))
				.map_err(Error::from)
		};

		finish(KIND, result)
	}

	/// Writes the in-memory view to the session slot under the exclusive lock.
	///
	/// The "changed" flag is cleared before the blob is encoded. A mutation racing between the
	/// clear and the write can therefore be dropped from this flush and leave the flag unset.
	pub fn persist(&self) -> Result<()> {
		const KIND: OpKind = OpKind::CachePersist;

		let _span = OpSpan::new(KIND, "persist").entered();

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = {
			let _exclusive = self.lock.write();

			self.cache.set_has_state_changed(false);
			self.cache
				.serialize()
				.and_then(|blob| self.store.set(&self.cache_id, blob))
				.map_err(Error::from)
		};

		finish(KIND, result)
	}

	/// Removes `item` from the cache and flushes immediately.
	pub fn delete_item(&self, item: &TokenCacheItem) -> Result<()> {
		const KIND: OpKind = OpKind::CacheDelete;

		let _span = OpSpan::new(KIND, "delete_item").entered();

		obs::record_op_outcome(KIND, OpOutcome::Attempt);
		self.cache.remove(&item.key);

		finish(KIND, self.persist())
	}

	/// Empties the cache and removes its session slot entirely.
	pub fn clear(&self) -> Result<()> {
		const KIND: OpKind = OpKind::CacheClear;

		let _span = OpSpan::new(KIND, "clear").entered();

		obs::record_op_outcome(KIND, OpOutcome::Attempt);
		self.cache.clear();

		let result = {
			let _exclusive = self.lock.write();

			self.store.remove(&self.cache_id).map_err(Error::from)
		};

		// The slot is gone; a later `after_access` must not write an empty blob back.
		self.cache.set_has_state_changed(false);

		finish(KIND, result)
	}

	/// Runs `f` inside an access window bracketed by this cache's hooks.
	pub fn access<T, F>(&self, args: &AccessArgs, f: F) -> Result<T>
	where
		F: FnOnce(&TokenCache) -> T,
	{
		cache::access(&self.cache, self, args, f)
	}
}
impl CacheNotifications for SessionTokenCache {
	fn before_access(&self, _args: &AccessArgs) -> Result<()> {
		self.load()
	}

	fn after_access(&self, _args: &AccessArgs) -> Result<()> {
		if self.cache.has_state_changed() { self.persist() } else { Ok(()) }
	}
}
impl Debug for SessionTokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionTokenCache")
			.field("user_id", &self.user_id)
			.field("cache_id", &self.cache_id)
			.field("len", &self.cache.len())
			.field("has_state_changed", &self.cache.has_state_changed())
			.finish()
	}
}

fn finish<T>(kind: OpKind, result: Result<T>) -> Result<T> {
	if let Err(e) = &result {
		obs::trace_failure(kind, e);
	}

	obs::record_op_outcome(kind, OpOutcome::of(&result));

	result
}
