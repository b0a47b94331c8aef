//! Thread-safe in-memory [`KeyValueStore`] for tests, demos, and ephemeral hosts.

// self
use crate::{
	_prelude::*,
	store::{KeyValueStore, StoreError},
};

type StoreMap = Arc<RwLock<HashMap<String, String>>>;

/// Storage backend that keeps entries in-process; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Returns true when no entries are stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Returns the number of stored entries.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when `key` is present.
	pub fn contains(&self, key: &str) -> bool {
		self.0.read().contains_key(key)
	}
}
impl KeyValueStore for MemoryStore {
	fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		Ok(self.0.read().get(key).cloned())
	}

	fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
		self.0.write().insert(key.to_owned(), value);

		Ok(())
	}

	fn remove(&self, key: &str) -> Result<(), StoreError> {
		self.0.write().remove(key);

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn set_get_remove_round_trip() {
		let store = MemoryStore::default();

		store.set("k", "v1".into()).expect("Memory store writes should succeed.");
		store.set("k", "v2".into()).expect("Memory store overwrites should succeed.");

		assert_eq!(store.get("k").expect("Memory store reads should succeed."), Some("v2".into()));
		assert_eq!(store.len(), 1);

		store.remove("k").expect("Removing an existing key should succeed.");
		store.remove("k").expect("Removing a missing key should succeed.");

		assert!(store.is_empty());
		assert_eq!(store.get("k").expect("Memory store reads should succeed."), None);
	}

	#[test]
	fn clones_share_entries() {
		let store = MemoryStore::default();
		let clone = store.clone();

		clone.set("shared", "yes".into()).expect("Memory store writes should succeed.");

		assert!(store.contains("shared"));
	}
}
