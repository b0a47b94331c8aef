//! High-level sign-in orchestration.
//!
//! [`AuthClient`] is the public surface UI collaborators talk to. `sign_in` covers the outbound
//! half (build the authorization URL, persist the pending request, navigate away) and
//! `callback` covers the inbound half that runs on the next page load.

pub mod callback;
pub mod sign_in;

pub use callback::*;
pub use sign_in::*;

// self
use crate::{
	_prelude::*,
	auth::{Identity, IdentityProvider, TokenSecret},
	browser::Location,
	config::AuthConfig,
	http::HttpTransport,
	profile::ProfileFetcher,
	provider::ProviderDescriptor,
	session::{SessionStore, SessionWatch},
	store::KeyValueStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestAuthClient = AuthClient<ReqwestHttpClient>;

/// Coordinates implicit-flow sign-in against the configured providers.
///
/// One instance corresponds to one page load: it hydrates the session from durable storage on
/// construction and processes the redirect callback at most once.
pub struct AuthClient<C>
where
	C: ?Sized + HttpTransport,
{
	redirect_uri: Url,
	providers: BTreeMap<IdentityProvider, ProviderDescriptor>,
	transient: Arc<dyn KeyValueStore>,
	location: Arc<dyn Location>,
	session: SessionStore,
	profiles: Option<ProfileFetcher<C>>,
	callback_latch: Arc<AsyncMutex<bool>>,
}
impl<C> AuthClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	///
	/// `local` plays the role of `localStorage` (the persisted identity) and `transient` the
	/// role of `sessionStorage` (the pending authorization request).
	pub fn with_http_client(
		config: &AuthConfig,
		local: Arc<dyn KeyValueStore>,
		transient: Arc<dyn KeyValueStore>,
		location: Arc<dyn Location>,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		let providers = config.descriptors()?;
		let profiles = if config.enrich_profiles && providers.contains_key(&IdentityProvider::Microsoft)
		{
			Some(ProfileFetcher::new(http_client, config.graph_base_url()?))
		} else {
			None
		};

		Ok(Self {
			redirect_uri: config.redirect_uri.clone(),
			providers,
			transient,
			location,
			session: SessionStore::hydrate(local),
			profiles,
			callback_latch: Default::default(),
		})
	}

	/// Redirect URI sent with every authorization request.
	pub fn redirect_uri(&self) -> &Url {
		&self.redirect_uri
	}

	/// Descriptor for a configured provider.
	pub fn descriptor(&self, provider: IdentityProvider) -> Result<&ProviderDescriptor> {
		self.providers.get(&provider).ok_or(Error::UnknownProvider { provider })
	}

	/// Providers this client can sign in with, in a stable order.
	pub fn providers(&self) -> impl Iterator<Item = IdentityProvider> + '_ {
		self.providers.keys().copied()
	}

	/// Clears the persisted identity and the session. Calling it twice is harmless.
	///
	/// When storage refuses the removal the session stays signed in and the error is returned.
	pub fn sign_out(&self) -> Result<()> {
		self.session.clear()?;

		Ok(())
	}

	/// Subscribes to session changes; the first value is the current session.
	pub fn observe_session(&self) -> SessionWatch {
		self.session.subscribe()
	}

	/// Session store backing this client.
	pub fn session(&self) -> &SessionStore {
		&self.session
	}

	/// Snapshot of the signed-in identity.
	pub fn current_identity(&self) -> Option<Identity> {
		self.session.current_identity()
	}

	/// Snapshot of the access token obtained during this page load.
	pub fn current_access_token(&self) -> Option<TokenSecret> {
		self.session.current_access_token()
	}

	/// Snapshot of the identity token obtained during this page load.
	pub fn current_identity_token(&self) -> Option<TokenSecret> {
		self.session.current_identity_token()
	}
}
#[cfg(feature = "reqwest")]
impl AuthClient<ReqwestHttpClient> {
	/// Creates a client with its own reqwest-backed transport.
	pub fn new(
		config: &AuthConfig,
		local: Arc<dyn KeyValueStore>,
		transient: Arc<dyn KeyValueStore>,
		location: Arc<dyn Location>,
	) -> Result<Self> {
		Self::with_http_client(config, local, transient, location, ReqwestHttpClient::default())
	}
}
impl<C> Debug for AuthClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthClient")
			.field("redirect_uri", &self.redirect_uri.as_str())
			.field("providers", &self.providers.keys().collect::<Vec<_>>())
			.field("profile_enrichment", &self.profiles.is_some())
			.finish()
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, config::ProviderConfig};

	fn config() -> AuthConfig {
		AuthConfig::new(Url::parse("https://app.example/tabs/tab1").expect("Redirect should parse."))
			.with_google(ProviderConfig::new("google-client").expect("Client id should be valid."))
	}

	#[test]
	fn unconfigured_provider_is_rejected() {
		let harness = build_test_client(&config(), "https://app.example/tabs/tab1");
		let err = harness
			.client
			.begin_sign_in(IdentityProvider::Microsoft)
			.expect_err("Microsoft is not configured.");

		assert!(matches!(err, Error::UnknownProvider { provider: IdentityProvider::Microsoft }));
		assert!(harness.location.navigations().is_empty());
		assert!(harness.transient.is_empty());
	}

	#[test]
	fn sign_out_twice_matches_sign_out_once() {
		let harness = build_test_client(&config(), "https://app.example/tabs/tab1");

		harness.client.sign_out().expect("First sign-out should succeed.");

		let once = harness.client.session().current();

		harness.client.sign_out().expect("Second sign-out should succeed.");

		assert_eq!(harness.client.session().current(), once);
		assert_eq!(harness.client.current_identity(), None);
	}

	#[test]
	fn enrichment_is_only_wired_for_microsoft() {
		let harness = build_test_client(&config(), "https://app.example/");

		assert!(harness.client.profiles.is_none());
		assert_eq!(harness.client.providers().collect::<Vec<_>>(), vec![IdentityProvider::Google]);
	}
}
