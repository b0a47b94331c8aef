//! Walks one redirect round-trip end to end without a browser.
//!
//! 1. Page load #1 calls [`AuthClient::begin_sign_in`], which saves the pending request and
//!    "navigates" to Microsoft.
//! 2. The demo plays the provider: it echoes `state`, binds `nonce` into an unsigned identity
//!    token, and builds the callback fragment.
//! 3. Page load #2 runs [`AuthClient::handle_redirect_callback`], which validates the response,
//!    enriches the identity from a mocked Microsoft Graph, and publishes it.

// std
use std::sync::Arc;
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use color_eyre::{Result, eyre::eyre};
use httpmock::prelude::*;
use serde_json::json;
// self
use oauth2_implicit::{
	auth::IdentityProvider,
	browser::{Location, MemoryLocation},
	config::{AuthConfig, ProviderConfig},
	flows::{AuthClient, CallbackOutcome},
	store::MemoryStore,
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let _me = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1.0/me");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"displayName":"Demo User","mail":"demo@contoso.example"}"#);
		})
		.await;
	let _photo = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1.0/me/photo/$value");
			then.status(404);
		})
		.await;
	let config = AuthConfig::new(Url::parse("https://app.example/tabs/tab1")?)
		.with_google(ProviderConfig::new("demo-google-client")?)
		.with_microsoft(ProviderConfig::new("demo-microsoft-client")?)
		.with_graph_base_url(Url::parse(&server.url("/v1.0"))?);
	let local = Arc::new(MemoryStore::default());
	let transient = Arc::new(MemoryStore::default());
	let first_location = Arc::new(MemoryLocation::new(config.redirect_uri.clone()));
	let first_page =
		AuthClient::new(&config, local.clone(), transient.clone(), first_location.clone())?;
	let authorize_url = first_page.begin_sign_in(IdentityProvider::Microsoft)?;

	println!("Navigated to: {authorize_url}");

	let param = |name: &str| {
		authorize_url
			.query_pairs()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.into_owned())
			.ok_or_else(|| eyre!("Authorization URL is missing `{name}`."))
	};
	let state = param("state")?;
	let nonce = param("nonce")?;
	let payload = serde_json::to_vec(&json!({
		"oid": "00000000-0000-0000-66f3-3332eca7ea81",
		"preferred_username": "demo@contoso.example",
		"nonce": nonce,
	}))?;
	let id_token = format!(
		"{}.{}.c2lnbmF0dXJl",
		URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#),
		URL_SAFE_NO_PAD.encode(payload)
	);
	let mut callback = config.redirect_uri.clone();

	callback.set_fragment(Some(&format!(
		"access_token=demo-access&id_token={id_token}&state={state}&expires_in=3599"
	)));

	let second_location = Arc::new(MemoryLocation::new(callback));
	let second_page = AuthClient::new(&config, local, transient, second_location.clone())?;
	let mut session = second_page.observe_session();

	match second_page.handle_redirect_callback().await {
		CallbackOutcome::Resolved(identity) => println!("Signed in: {identity:?}"),
		CallbackOutcome::Rejected(rejection) => println!("Sign-in rejected: {rejection}"),
		CallbackOutcome::Idle => println!("No callback to process."),
	}

	println!("Address bar: {}", second_location.href());

	if let Some(latest) = session.next().await {
		println!("Observer sees: {:?}", latest.identity());
	}

	Ok(())
}
