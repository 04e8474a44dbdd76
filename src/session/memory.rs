//! Thread-safe in-memory [`SessionStore`] for single-process deployments and tests.

// self
use crate::{
	_prelude::*,
	session::{SessionStore, StoreError},
};

type SlotMap = Arc<RwLock<HashMap<String, Vec<u8>>>>;

/// Keeps session slots in-process; clones share the same slots.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore(SlotMap);
impl MemorySessionStore {
	/// Returns `true` when a slot exists under `key`.
	pub fn contains(&self, key: &str) -> bool {
		self.0.read().contains_key(key)
	}

	/// Number of occupied slots.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no slot is occupied.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl SessionStore for MemorySessionStore {
	fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
		Ok(self.0.read().get(key).cloned())
	}

	fn set(&self, key: &str, blob: Vec<u8>) -> Result<(), StoreError> {
		self.0.write().insert(key.to_owned(), blob);

		Ok(())
	}

	fn remove(&self, key: &str) -> Result<(), StoreError> {
		self.0.write().remove(key);

		Ok(())
	}
}
