//! Test-only [`KeyValueStore`] whose operations can be switched to fail.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::store::{KeyValueStore, MemoryStore, StoreError};

/// [`MemoryStore`] wrapper with per-operation failure switches.
#[derive(Debug, Default)]
pub(crate) struct FaultyStore {
	pub(crate) inner: MemoryStore,
	pub(crate) fail_get: AtomicBool,
	pub(crate) fail_set: AtomicBool,
	pub(crate) fail_remove: AtomicBool,
}
impl FaultyStore {
	fn check(flag: &AtomicBool, op: &str) -> Result<(), StoreError> {
		if flag.load(Ordering::SeqCst) {
			return Err(StoreError::Backend { message: format!("{op} is unavailable") });
		}

		Ok(())
	}
}
impl KeyValueStore for FaultyStore {
	fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		Self::check(&self.fail_get, "get")?;

		self.inner.get(key)
	}

	fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
		Self::check(&self.fail_set, "set")?;

		self.inner.set(key, value)
	}

	fn remove(&self, key: &str) -> Result<(), StoreError> {
		Self::check(&self.fail_remove, "remove")?;

		self.inner.remove(key)
	}
}
