//! Process-wide session state with persistence and push-based observation.
//!
//! [`SessionStore`] is the only writer of the [`Session`]. The identity is persisted as JSON
//! under [`keys::IDENTITY`]; tokens are memory-only, so a reloaded page observes the identity
//! without tokens until the user signs in again.

// crates.io
use tokio::sync::watch;
// self
use crate::{
	_prelude::*,
	auth::{Identity, SessionTokens, TokenSecret},
	obs,
	store::{KeyValueStore, StoreError, keys},
};

/// Snapshot of the current sign-in state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
	identity: Option<Identity>,
	tokens: Option<SessionTokens>,
}
impl Session {
	/// Session holding a freshly resolved identity and the tokens it came from.
	pub fn authenticated(identity: Identity, tokens: SessionTokens) -> Self {
		Self { identity: Some(identity), tokens: Some(tokens) }
	}

	fn hydrated(identity: Identity) -> Self {
		Self { identity: Some(identity), tokens: None }
	}

	/// Current identity, if signed in.
	pub fn identity(&self) -> Option<&Identity> {
		self.identity.as_ref()
	}

	/// Tokens obtained during this page load, if any.
	pub fn tokens(&self) -> Option<&SessionTokens> {
		self.tokens.as_ref()
	}

	/// Access token obtained during this page load, if any.
	pub fn access_token(&self) -> Option<&TokenSecret> {
		self.tokens.as_ref().map(|tokens| &tokens.access_token)
	}

	/// Identity token obtained during this page load, if any.
	pub fn identity_token(&self) -> Option<&TokenSecret> {
		self.tokens.as_ref().map(|tokens| &tokens.identity_token)
	}

	/// Returns true when an identity is present.
	pub fn is_signed_in(&self) -> bool {
		self.identity.is_some()
	}
}

/// Owner of the [`Session`]; clones share the same state and subscribers.
#[derive(Clone, Debug)]
pub struct SessionStore {
	storage: Arc<dyn KeyValueStore>,
	sender: Arc<watch::Sender<Session>>,
}
impl SessionStore {
	/// Builds the store, restoring a previously persisted identity when one is readable.
	///
	/// A corrupt record is logged, removed, and ignored.
	pub fn hydrate(storage: Arc<dyn KeyValueStore>) -> Self {
		let initial =
			Self::load_identity(storage.as_ref()).map(Session::hydrated).unwrap_or_default();
		let (sender, _) = watch::channel(initial);

		Self { storage, sender: Arc::new(sender) }
	}

	fn load_identity(storage: &dyn KeyValueStore) -> Option<Identity> {
		let raw = match storage.get(keys::IDENTITY) {
			Ok(raw) => raw?,
			Err(e) => {
				obs::record_storage_failure(keys::IDENTITY, &e);

				return None;
			},
		};

		match serde_json::from_str(&raw) {
			Ok(identity) => Some(identity),
			Err(e) => {
				obs::record_discarded_identity(&e);

				if let Err(e) = storage.remove(keys::IDENTITY) {
					obs::record_storage_failure(keys::IDENTITY, &e);
				}

				None
			},
		}
	}

	/// Persists `identity`, then publishes it together with `tokens`.
	///
	/// Nothing is published when persistence fails.
	pub fn set_identity(&self, identity: Identity, tokens: SessionTokens) -> Result<(), StoreError> {
		let serialized = serde_json::to_string(&identity)
			.map_err(|e| StoreError::Serialization { message: e.to_string() })?;

		self.storage.set(keys::IDENTITY, serialized)?;
		obs::record_identity_published(&identity.key());
		self.sender.send_replace(Session::authenticated(identity, tokens));

		Ok(())
	}

	/// Removes the persisted identity, then publishes the signed-out session.
	///
	/// When removal fails nothing is published, so memory and storage keep agreeing. Clearing
	/// an already empty session notifies nobody.
	pub fn clear(&self) -> Result<(), StoreError> {
		self.storage.remove(keys::IDENTITY)?;
		self.sender.send_if_modified(|session| {
			if *session == Session::default() {
				return false;
			}

			*session = Session::default();

			true
		});

		Ok(())
	}

	/// Snapshot of the whole session.
	pub fn current(&self) -> Session {
		self.sender.borrow().clone()
	}

	/// Snapshot of the current identity.
	pub fn current_identity(&self) -> Option<Identity> {
		self.sender.borrow().identity.clone()
	}

	/// Snapshot of the current access token.
	pub fn current_access_token(&self) -> Option<TokenSecret> {
		self.sender.borrow().access_token().cloned()
	}

	/// Snapshot of the current identity token.
	pub fn current_identity_token(&self) -> Option<TokenSecret> {
		self.sender.borrow().identity_token().cloned()
	}

	/// Subscribes to session changes.
	pub fn subscribe(&self) -> SessionWatch {
		SessionWatch { receiver: self.sender.subscribe(), primed: false }
	}
}

/// Subscription handle returned by [`SessionStore::subscribe`].
///
/// The first [`next`](Self::next) resolves immediately with the latest session. Later calls
/// wait for the next publish; when several publishes happen between calls only the newest is
/// observed.
#[derive(Debug)]
pub struct SessionWatch {
	receiver: watch::Receiver<Session>,
	primed: bool,
}
impl SessionWatch {
	/// Latest session without waiting or marking it seen.
	pub fn latest(&self) -> Session {
		self.receiver.borrow().clone()
	}

	/// Waits for the next session value; `None` once the store is gone.
	pub async fn next(&mut self) -> Option<Session> {
		if !self.primed {
			self.primed = true;

			return Some(self.receiver.borrow_and_update().clone());
		}

		self.receiver.changed().await.ok()?;

		Some(self.receiver.borrow_and_update().clone())
	}
}
