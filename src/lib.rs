//! Client-side OAuth 2.0 implicit-flow sign-in for Google and Microsoft.
//!
//! The crate builds CSRF-safe authorization redirects, processes the returned fragment into a
//! provider-agnostic [`Identity`](auth::Identity) from unverified identity-token claims, and
//! keeps the result in a persisted session store that observers subscribe to.
//!
//! Browser collaborators sit behind traits: [`store::KeyValueStore`] for `localStorage` and
//! `sessionStorage`, [`browser::Location`] for `window.location`, and [`http::HttpTransport`]
//! for the optional Microsoft Graph lookups.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod browser;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod profile;
pub mod provider;
pub mod session;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	// self
	use crate::{
		browser::MemoryLocation, config::AuthConfig, flows::AuthClient, http::ReqwestHttpClient,
		store::MemoryStore,
	};

	/// Client type alias used by reqwest-backed tests.
	pub type ReqwestTestClient = AuthClient<ReqwestHttpClient>;

	/// Everything a test needs to drive one simulated page load.
	pub struct TestHarness {
		/// Client under test.
		pub client: ReqwestTestClient,
		/// Stand-in for `localStorage`.
		pub local: Arc<MemoryStore>,
		/// Stand-in for `sessionStorage`.
		pub transient: Arc<MemoryStore>,
		/// Stand-in for `window.location`.
		pub location: Arc<MemoryLocation>,
	}
	impl TestHarness {
		/// Simulates a fresh page load at `url` that shares this harness' storage.
		pub fn reload(&self, config: &AuthConfig, url: &str) -> Self {
			build_test_client_with(config, url, self.local.clone(), self.transient.clone())
		}
	}

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a client backed by empty in-memory storage with the location set to `url`.
	pub fn build_test_client(config: &AuthConfig, url: &str) -> TestHarness {
		build_test_client_with(
			config,
			url,
			Arc::new(MemoryStore::default()),
			Arc::new(MemoryStore::default()),
		)
	}

	fn build_test_client_with(
		config: &AuthConfig,
		url: &str,
		local: Arc<MemoryStore>,
		transient: Arc<MemoryStore>,
	) -> TestHarness {
		let location = Arc::new(MemoryLocation::new(
			Url::parse(url).expect("Test location URL should parse successfully."),
		));
		let client = AuthClient::with_http_client(
			config,
			local.clone(),
			transient.clone(),
			location.clone(),
			test_reqwest_http_client(),
		)
		.expect("Test client should build from the provided configuration.");

		TestHarness { client, local, transient, location }
	}

	/// Encodes `claims` into an unsigned compact token (`header.payload.signature`).
	pub fn fake_id_token(claims: &serde_json::Value) -> String {
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
		let payload = URL_SAFE_NO_PAD.encode(
			serde_json::to_vec(claims).expect("Claims fixture should serialize to JSON."),
		);

		format!("{header}.{payload}.c2lnbmF0dXJl")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
