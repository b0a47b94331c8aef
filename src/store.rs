//! Key/value storage contracts standing in for browser `localStorage` and `sessionStorage`.
//!
//! The client uses two stores: a durable one that survives reloads (the persisted identity)
//! and a transient one scoped to the redirect round-trip (the pending authorization request).

pub mod file;
pub mod memory;
#[cfg(test)] mod faulty;

pub use file::FileStore;
pub use memory::MemoryStore;
#[cfg(test)] pub(crate) use faulty::FaultyStore;

// self
use crate::_prelude::*;

/// Well-known storage keys.
pub mod keys {
	/// Durable key holding the JSON-serialized identity.
	pub const IDENTITY: &str = "google_user";
	/// Transient key holding the pending CSRF `state`.
	pub const STATE: &str = "oauth_state";
	/// Transient key holding the pending `nonce`.
	pub const NONCE: &str = "oauth_nonce";
	/// Transient key holding the provider that initiated sign-in.
	pub const PROVIDER: &str = "auth_provider";
}

/// Synchronous string storage, mirroring the Web Storage API.
pub trait KeyValueStore
where
	Self: Debug + Send + Sync,
{
	/// Returns the value stored under `key`, if any.
	fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

	/// Stores or replaces the value under `key`.
	fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

	/// Removes `key`; removing a missing key is not an error.
	fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Error type produced by [`KeyValueStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure (quota, I/O, permissions).
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
