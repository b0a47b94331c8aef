#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use oauth2_implicit::{
	auth::IdentityProvider,
	browser::MemoryLocation,
	config::{AuthConfig, ProviderConfig},
	flows::AuthClient,
	http::ReqwestHttpClient,
	reqwest::Client,
	store::{KeyValueStore, MemoryStore, keys},
	url::Url,
};

pub const APP_URL: &str = "https://app.example/tabs/tab1";

/// One simulated page load sharing storage with earlier loads.
pub struct Page {
	pub client: AuthClient<ReqwestHttpClient>,
	pub local: Arc<MemoryStore>,
	pub transient: Arc<MemoryStore>,
	pub location: Arc<MemoryLocation>,
}
impl Page {
	pub fn load(config: &AuthConfig, url: &str) -> Self {
		Self::load_with(config, url, Arc::default(), Arc::default())
	}

	pub fn load_with(
		config: &AuthConfig,
		url: &str,
		local: Arc<MemoryStore>,
		transient: Arc<MemoryStore>,
	) -> Self {
		let location = Arc::new(MemoryLocation::new(
			Url::parse(url).expect("Page URL fixture should parse."),
		));
		let http = ReqwestHttpClient::with_client(
			Client::builder()
				.danger_accept_invalid_certs(true)
				.build()
				.expect("Test HTTP client should build."),
		);
		let client = AuthClient::with_http_client(
			config,
			local.clone(),
			transient.clone(),
			location.clone(),
			http,
		)
		.expect("Client should build from the test configuration.");

		Self { client, local, transient, location }
	}

	/// Navigates to `url` in a fresh page that keeps this page's storage.
	pub fn reload(&self, config: &AuthConfig, url: &str) -> Self {
		Self::load_with(config, url, self.local.clone(), self.transient.clone())
	}

	pub fn seed_pending(&self, state: &str, nonce: &str, provider: IdentityProvider) {
		self.transient.set(keys::STATE, state.into()).expect("Seeding state should succeed.");
		self.transient.set(keys::NONCE, nonce.into()).expect("Seeding nonce should succeed.");
		self.transient
			.set(keys::PROVIDER, provider.as_str().into())
			.expect("Seeding provider should succeed.");
	}
}

pub fn google_config() -> AuthConfig {
	AuthConfig::new(Url::parse(APP_URL).expect("Redirect fixture should parse."))
		.with_google(ProviderConfig::new("google-client").expect("Client id should be valid."))
}

pub fn multi_provider_config(graph_base_url: &str) -> AuthConfig {
	google_config()
		.with_microsoft(ProviderConfig::new("ms-client").expect("Client id should be valid."))
		.with_graph_base_url(Url::parse(graph_base_url).expect("Graph URL fixture should parse."))
}

/// Unsigned compact token carrying `claims`.
pub fn fake_id_token(claims: &serde_json::Value) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD
		.encode(serde_json::to_vec(claims).expect("Claims fixture should serialize to JSON."));

	format!("{header}.{payload}.c2lnbmF0dXJl")
}

pub fn callback_url(fragment: &str) -> String {
	format!("{APP_URL}#{fragment}")
}
