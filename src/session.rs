//! Session store contract and built-in implementations for per-user token cache blobs.
//!
//! A session store is a keyed byte-blob map scoped to a user's web session. The token cache
//! keeps exactly one slot per identity under
//! [`UserId::token_cache_key`](crate::auth::UserId::token_cache_key).

pub mod file;
pub mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

// self
use crate::_prelude::*;

/// Suffix appended to a user identifier to form its token cache slot.
pub const TOKEN_CACHE_SUFFIX: &str = "_TokenCache";

/// Keyed blob storage backing session token caches.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Returns the blob stored under `key`, if any.
	fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

	/// Stores or replaces the blob under `key`.
	fn set(&self, key: &str, blob: Vec<u8>) -> Result<(), StoreError>;

	/// Removes the slot under `key`; removing a missing slot is not an error.
	fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Error type produced by [`SessionStore`] implementations and blob codecs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Blob could not be encoded or decoded.
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
