//! File-backed [`KeyValueStore`] for native hosts that need identities to survive restarts.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{KeyValueStore, StoreError},
};

/// Persists entries to a JSON object file after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<BTreeMap<String, String>>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<BTreeMap<String, String>, StoreError> {
		if !path.exists() {
			return Ok(BTreeMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(BTreeMap::new());
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &BTreeMap<String, String>) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
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
impl KeyValueStore for FileStore {
	fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		Ok(self.inner.read().get(key).cloned())
	}

	fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
		let mut guard = self.inner.write();

		guard.insert(key.to_owned(), value);

		self.persist_locked(&guard)
	}

	fn remove(&self, key: &str) -> Result<(), StoreError> {
		let mut guard = self.inner.write();

		if guard.remove(key).is_none() {
			return Ok(());
		}

		self.persist_locked(&guard)
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;

	fn temp_path(tag: &str) -> PathBuf {
		let unique = format!(
			"oauth2_implicit_file_store_{tag}_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path("round_trip");
		let store = FileStore::open(&path).expect("Failed to open file store.");

		store.set("google_user", "{\"subject\":\"1\"}".into()).expect("Failed to write entry.");
		store.set("other", "x".into()).expect("Failed to write entry.");
		store.remove("other").expect("Failed to remove entry.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store.");

		assert_eq!(
			reopened.get("google_user").expect("Failed to read entry."),
			Some("{\"subject\":\"1\"}".into())
		);
		assert_eq!(reopened.get("other").expect("Failed to read entry."), None);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store {}: {e}", path.display())
		});
	}

	#[test]
	fn corrupt_snapshot_is_reported() {
		let path = temp_path("corrupt");

		fs::write(&path, b"{not json").expect("Failed to seed corrupt snapshot.");

		let err = FileStore::open(&path).expect_err("Corrupt snapshots must not load silently.");

		assert!(matches!(err, StoreError::Serialization { .. }));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store {}: {e}", path.display())
		});
	}
}
