//! Outbound half of the implicit flow: authorization URL construction and navigation.

// self
use crate::{
	_prelude::*,
	auth::{self, IdentityProvider, RandomError, ScopeSet},
	flows::AuthClient,
	http::HttpTransport,
	oauth::AuthorizeFacade,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::ProviderDescriptor,
	store::{KeyValueStore, StoreError, keys},
};

const STATE_LEN: usize = 32;
const NONCE_LEN: usize = 32;

/// CSRF `state` and replay `nonce` for one redirect round-trip.
///
/// Created right before navigating to the provider and consumed exactly once by the callback
/// on the next page load. Starting a new sign-in overwrites any previous request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingAuthRequest {
	/// Opaque value the provider echoes back in the fragment.
	pub state: String,
	/// Value the provider binds into the identity token.
	pub nonce: String,
	/// Provider the request was sent to.
	pub provider: IdentityProvider,
}
impl PendingAuthRequest {
	/// Draws fresh `state` and `nonce` values from the OS random source.
	pub fn generate(provider: IdentityProvider) -> Result<Self, RandomError> {
		Ok(Self {
			state: auth::random_string(STATE_LEN)?,
			nonce: auth::random_string(NONCE_LEN)?,
			provider,
		})
	}

	/// Writes the request to transient storage, replacing any earlier one.
	pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
		store.set(keys::STATE, self.state.clone())?;
		store.set(keys::NONCE, self.nonce.clone())?;
		store.set(keys::PROVIDER, self.provider.as_str().to_owned())
	}

	/// Reads the request and unconditionally deletes every transient key.
	///
	/// Returns `Ok(None)` when no complete request is on record. A missing provider label
	/// means Google, the only provider of single-provider deployments; an unrecognized label
	/// makes the request unusable.
	pub fn take(store: &dyn KeyValueStore) -> Result<Option<Self>, StoreError> {
		let read = Self::read(store);

		for key in [keys::STATE, keys::NONCE, keys::PROVIDER] {
			if let Err(e) = store.remove(key) {
				obs::record_storage_failure(key, &e);
			}
		}

		read
	}

	fn read(store: &dyn KeyValueStore) -> Result<Option<Self>, StoreError> {
		let state = store.get(keys::STATE)?.filter(|value| !value.is_empty());
		let nonce = store.get(keys::NONCE)?.filter(|value| !value.is_empty());
		let (Some(state), Some(nonce)) = (state, nonce) else {
			return Ok(None);
		};
		let provider = match store.get(keys::PROVIDER)? {
			None => IdentityProvider::Google,
			Some(label) => match label.parse() {
				Ok(provider) => provider,
				Err(_) => return Ok(None),
			},
		};

		Ok(Some(Self { state, nonce, provider }))
	}
}

/// Authorization URL paired with the request it embeds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationRedirect {
	/// Fully-formed HTTPS URL to send the browser to.
	pub url: Url,
	/// Request whose `state`/`nonce` appear in `url`.
	pub request: PendingAuthRequest,
}

/// Builds the authorization URL for `descriptor` with fresh `state` and `nonce`.
///
/// Nothing is persisted and nothing navigates; callers decide what to do with the result.
pub fn build_auth_url(
	descriptor: &ProviderDescriptor,
	redirect_uri: &Url,
	scope: &ScopeSet,
) -> Result<AuthorizationRedirect, RandomError> {
	let request = PendingAuthRequest::generate(descriptor.provider)?;
	let url = AuthorizeFacade::from_descriptor(descriptor, redirect_uri).authorize_url(
		scope,
		&request.state,
		&request.nonce,
	);

	Ok(AuthorizationRedirect { url, request })
}

impl<C> AuthClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Builds the authorization URL for `provider` using `scope` and the configured redirect URI.
	pub fn build_auth_url(
		&self,
		provider: IdentityProvider,
		scope: &ScopeSet,
	) -> Result<AuthorizationRedirect> {
		let descriptor = self.descriptor(provider)?;

		Ok(build_auth_url(descriptor, &self.redirect_uri, scope)?)
	}

	/// Starts sign-in: persists a fresh pending request and navigates to the provider.
	///
	/// Returns the URL navigated to. The page is expected to unload afterwards; the result
	/// arrives through [`handle_redirect_callback`](Self::handle_redirect_callback) on the
	/// next load.
	pub fn begin_sign_in(&self, provider: IdentityProvider) -> Result<Url> {
		let _guard = FlowSpan::new(FlowKind::SignIn, "begin_sign_in").entered();

		obs::record_flow_outcome(FlowKind::SignIn, FlowOutcome::Attempt);

		let result = self.prepare_sign_in(provider);
		let outcome = if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure };

		obs::record_flow_outcome(FlowKind::SignIn, outcome);

		let url = result?;

		self.location.assign(&url);

		Ok(url)
	}

	fn prepare_sign_in(&self, provider: IdentityProvider) -> Result<Url> {
		let descriptor = self.descriptor(provider)?;
		let redirect = build_auth_url(descriptor, &self.redirect_uri, &descriptor.default_scopes)?;

		redirect.request.save(self.transient.as_ref())?;

		Ok(redirect.url)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{auth::ClientId, store::MemoryStore};

	fn descriptor() -> ProviderDescriptor {
		ProviderDescriptor::google(ClientId::new("google-client").expect("Client should be valid."))
			.expect("Google preset should build.")
	}

	fn query_value(url: &Url, name: &str) -> Option<String> {
		url.query_pairs().find(|(key, _)| key == name).map(|(_, value)| value.into_owned())
	}

	#[test]
	fn url_and_request_agree_on_state_and_nonce() {
		let redirect_uri =
			Url::parse("https://app.example/tabs/tab1").expect("Redirect should parse.");
		let descriptor = descriptor();
		let redirect = build_auth_url(&descriptor, &redirect_uri, &descriptor.default_scopes)
			.expect("Authorization URL should build.");

		assert_eq!(redirect.request.state.len(), 32);
		assert_eq!(redirect.request.nonce.len(), 32);
		assert_ne!(redirect.request.state, redirect.request.nonce);
		assert_eq!(query_value(&redirect.url, "state"), Some(redirect.request.state.clone()));
		assert_eq!(query_value(&redirect.url, "nonce"), Some(redirect.request.nonce.clone()));
		assert_eq!(query_value(&redirect.url, "response_type").as_deref(), Some("token id_token"));
		assert_eq!(
			query_value(&redirect.url, "redirect_uri").as_deref(),
			Some("https://app.example/tabs/tab1")
		);
		assert!(redirect.url.as_str().contains("response_type=token+id_token"));
		assert!(
			redirect.url.as_str().contains("redirect_uri=https%3A%2F%2Fapp.example%2Ftabs%2Ftab1")
		);
	}

	#[test]
	fn take_consumes_every_key() {
		let store = MemoryStore::default();
		let request = PendingAuthRequest::generate(IdentityProvider::Microsoft)
			.expect("Random source should be available.");

		request.save(&store).expect("Saving should succeed.");

		assert_eq!(store.len(), 3);
		assert_eq!(PendingAuthRequest::take(&store).expect("Reading should succeed."), Some(request));
		assert!(store.is_empty());
		assert_eq!(PendingAuthRequest::take(&store).expect("Reading should succeed."), None);
	}

	#[test]
	fn newer_request_replaces_older_one() {
		let store = MemoryStore::default();
		let first = PendingAuthRequest::generate(IdentityProvider::Google)
			.expect("Random source should be available.");
		let second = PendingAuthRequest::generate(IdentityProvider::Google)
			.expect("Random source should be available.");

		first.save(&store).expect("Saving should succeed.");
		second.save(&store).expect("Saving should succeed.");

		assert_eq!(PendingAuthRequest::take(&store).expect("Reading should succeed."), Some(second));
	}

	#[test]
	fn missing_provider_label_defaults_to_google_and_unknown_label_is_unusable() {
		let store = MemoryStore::default();

		store.set(keys::STATE, "S".into()).expect("Seeding should succeed.");
		store.set(keys::NONCE, "N".into()).expect("Seeding should succeed.");

		let request = PendingAuthRequest::take(&store)
			.expect("Reading should succeed.")
			.expect("State and nonce are present.");

		assert_eq!(request.provider, IdentityProvider::Google);

		store.set(keys::STATE, "S".into()).expect("Seeding should succeed.");
		store.set(keys::NONCE, "N".into()).expect("Seeding should succeed.");
		store.set(keys::PROVIDER, "facebook".into()).expect("Seeding should succeed.");

		assert_eq!(PendingAuthRequest::take(&store).expect("Reading should succeed."), None);
		assert!(store.is_empty());
	}
}
