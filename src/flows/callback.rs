//! Inbound half of the implicit flow: processing the redirect fragment on page load.
//!
//! The processor walks `Idle → FragmentDetected → StateValidated → TokensParsed →
//! IdentityResolved`, or stops in `Rejected`. Whatever the outcome, the pending request is
//! consumed and the fragment is stripped from the visible URL. A rejection never touches the
//! session.

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{
		Claims, DecodeError, IdentifierError, Identity, IdentityProvider, SessionTokens,
		TokenSecret,
	},
	flows::{AuthClient, PendingAuthRequest},
	http::HttpTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::MappingError,
	store::StoreError,
};

/// Stages of callback processing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallbackState {
	/// No callback fragment on this page load.
	Idle,
	/// The fragment carries `access_token` or `error`.
	FragmentDetected,
	/// The returned `state` matched the pending request.
	StateValidated,
	/// Both tokens are present.
	TokensParsed,
	/// Claims were mapped and the identity was published.
	IdentityResolved,
	/// Processing stopped; the session is unchanged.
	Rejected,
}
impl CallbackState {
	/// Returns a stable label suitable for span or log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallbackState::Idle => "idle",
			CallbackState::FragmentDetected => "fragment_detected",
			CallbackState::StateValidated => "state_validated",
			CallbackState::TokensParsed => "tokens_parsed",
			CallbackState::IdentityResolved => "identity_resolved",
			CallbackState::Rejected => "rejected",
		}
	}
}
impl Display for CallbackState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Why a callback ended in [`CallbackState::Rejected`].
#[derive(Debug, ThisError)]
pub enum CallbackRejection {
	/// No pending request was on record, so `state` cannot be validated.
	#[error("No pending sign-in request is on record.")]
	MissingPendingRequest,
	/// Returned `state` differs from the pending request; possible CSRF.
	#[error("Returned state does not match the pending sign-in request.")]
	StateMismatch,
	/// The provider answered with an explicit error.
	#[error("Provider returned `{error}`.")]
	Provider {
		/// OAuth error code.
		error: String,
		/// Optional human-readable description from the provider.
		description: Option<String>,
	},
	/// `access_token` or `id_token` is absent.
	#[error("Callback is missing the access token or the identity token.")]
	MissingTokens,
	/// Identity token payload could not be decoded.
	#[error("Identity token is malformed.")]
	Decode(#[from] DecodeError),
	/// Identity token `nonce` differs from the pending request; possible replay.
	#[error("Identity token nonce does not match the pending sign-in request.")]
	NonceMismatch,
	/// Identity token has no subject claim.
	#[error("Identity token carries no subject.")]
	MissingSubject,
	/// Identity token subject is not a usable identifier.
	#[error("Identity token subject is invalid.")]
	InvalidSubject(#[source] IdentifierError),
	/// Reading the pending request or persisting the identity failed.
	#[error("Session storage failed.")]
	Persistence(#[source] StoreError),
}
impl CallbackRejection {
	/// Returns a stable label suitable for log and metric fields.
	pub const fn reason(&self) -> &'static str {
		match self {
			CallbackRejection::MissingPendingRequest => "missing_pending_request",
			CallbackRejection::StateMismatch => "state_mismatch",
			CallbackRejection::Provider { .. } => "provider_error",
			CallbackRejection::MissingTokens => "missing_tokens",
			CallbackRejection::Decode(_) => "decode_error",
			CallbackRejection::NonceMismatch => "nonce_mismatch",
			CallbackRejection::MissingSubject => "missing_subject",
			CallbackRejection::InvalidSubject(_) => "invalid_subject",
			CallbackRejection::Persistence(_) => "persistence",
		}
	}
}
impl From<MappingError> for CallbackRejection {
	fn from(error: MappingError) -> Self {
		match error {
			MappingError::MissingSubject => CallbackRejection::MissingSubject,
			MappingError::InvalidSubject(source) => CallbackRejection::InvalidSubject(source),
		}
	}
}

/// Terminal result of [`AuthClient::handle_redirect_callback`].
#[derive(Debug)]
pub enum CallbackOutcome {
	/// Nothing to process: no callback fragment, or the callback already ran on this load.
	Idle,
	/// A fresh identity was published.
	Resolved(Identity),
	/// The callback was rejected; the session is unchanged.
	Rejected(CallbackRejection),
}
impl CallbackOutcome {
	/// Terminal state reached.
	pub fn state(&self) -> CallbackState {
		match self {
			CallbackOutcome::Idle => CallbackState::Idle,
			CallbackOutcome::Resolved(_) => CallbackState::IdentityResolved,
			CallbackOutcome::Rejected(_) => CallbackState::Rejected,
		}
	}

	/// Published identity, if any.
	pub fn identity(&self) -> Option<&Identity> {
		match self {
			CallbackOutcome::Resolved(identity) => Some(identity),
			_ => None,
		}
	}

	/// Rejection reason, if any.
	pub fn rejection(&self) -> Option<&CallbackRejection> {
		match self {
			CallbackOutcome::Rejected(rejection) => Some(rejection),
			_ => None,
		}
	}
}

/// Parameters carried by a redirect fragment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
	/// `access_token`.
	pub access_token: Option<TokenSecret>,
	/// `id_token` (or `identityToken`).
	pub identity_token: Option<TokenSecret>,
	/// Echoed CSRF `state`.
	pub state: Option<String>,
	/// OAuth `error` code.
	pub error: Option<String>,
	/// OAuth `error_description`.
	pub error_description: Option<String>,
	/// `expires_in`, when it is a positive number of seconds.
	pub expires_in: Option<Duration>,
}
impl CallbackParams {
	/// Parses a raw fragment (without the leading `#`).
	///
	/// Empty values count as absent. When a key repeats, its first non-empty value wins, with
	/// `id_token` and `identityToken` treated as one key. `expires_in` keeps the first positive
	/// integer.
	pub fn parse(fragment: &str) -> Self {
		let mut params = Self::default();

		for (key, value) in form_urlencoded::parse(fragment.as_bytes()) {
			if value.is_empty() {
				continue;
			}

			match key.as_ref() {
				"access_token" => {
					params.access_token.get_or_insert_with(|| TokenSecret::new(value));
				},
				"id_token" | "identityToken" => {
					params.identity_token.get_or_insert_with(|| TokenSecret::new(value));
				},
				"state" => {
					params.state.get_or_insert_with(|| value.into_owned());
				},
				"error" => {
					params.error.get_or_insert_with(|| value.into_owned());
				},
				"error_description" => {
					params.error_description.get_or_insert_with(|| value.into_owned());
				},
				"expires_in" if params.expires_in.is_none() =>
					params.expires_in = value
						.trim()
						.parse::<i64>()
						.ok()
						.filter(|seconds| *seconds > 0)
						.map(Duration::seconds),
				_ => {},
			}
		}

		params
	}

	/// Extracts callback parameters from `url` when its fragment is a provider callback.
	pub fn from_url(url: &Url) -> Option<Self> {
		let params = Self::parse(url.fragment()?);

		params.is_callback().then_some(params)
	}

	/// A fragment is a callback when it carries a token or an explicit error.
	pub fn is_callback(&self) -> bool {
		self.access_token.is_some() || self.error.is_some()
	}
}

impl<C> AuthClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Processes the redirect fragment of the current page, if there is one.
	///
	/// Runs at most once per client; later calls return [`CallbackOutcome::Idle`]. On every
	/// terminal state the pending request is deleted and the fragment is removed from the
	/// visible URL.
	pub async fn handle_redirect_callback(&self) -> CallbackOutcome {
		let span = FlowSpan::new(FlowKind::Callback, "handle_redirect_callback");

		span.instrument(async move {
			let mut handled = self.callback_latch.lock().await;

			if *handled {
				return CallbackOutcome::Idle;
			}

			*handled = true;

			let href = self.location.href();
			let Some(params) = CallbackParams::from_url(&href) else {
				obs::record_callback_stage(CallbackState::Idle);

				return CallbackOutcome::Idle;
			};

			obs::record_callback_stage(CallbackState::FragmentDetected);
			obs::record_flow_outcome(FlowKind::Callback, FlowOutcome::Attempt);

			let pending = PendingAuthRequest::take(self.transient.as_ref());
			let outcome = match self.resolve_callback(params, pending).await {
				Ok(identity) => {
					obs::record_flow_outcome(FlowKind::Callback, FlowOutcome::Success);

					CallbackOutcome::Resolved(identity)
				},
				Err(rejection) => {
					obs::record_callback_stage(CallbackState::Rejected);
					obs::record_callback_rejection(&rejection);
					obs::record_flow_outcome(FlowKind::Callback, FlowOutcome::Failure);

					CallbackOutcome::Rejected(rejection)
				},
			};
			let mut clean = href;

			clean.set_fragment(None);
			self.location.replace(&clean);

			outcome
		})
		.await
	}

	async fn resolve_callback(
		&self,
		params: CallbackParams,
		pending: Result<Option<PendingAuthRequest>, StoreError>,
	) -> Result<Identity, CallbackRejection> {
		if let Some(error) = params.error {
			return Err(CallbackRejection::Provider { error, description: params.error_description });
		}

		let pending = pending
			.map_err(CallbackRejection::Persistence)?
			.ok_or(CallbackRejection::MissingPendingRequest)?;

		if params.state.as_deref() != Some(pending.state.as_str()) {
			return Err(CallbackRejection::StateMismatch);
		}

		obs::record_callback_stage(CallbackState::StateValidated);

		let (Some(access_token), Some(identity_token)) =
			(params.access_token, params.identity_token)
		else {
			return Err(CallbackRejection::MissingTokens);
		};

		obs::record_callback_stage(CallbackState::TokensParsed);

		let claims = Claims::decode(identity_token.expose())?;

		if claims.string("nonce").is_some_and(|nonce| nonce != pending.nonce) {
			return Err(CallbackRejection::NonceMismatch);
		}

		let mut identity = pending.provider.map_claims(&claims)?;
		let mut tokens = SessionTokens::new(access_token, identity_token);

		if let Some(expires_in) = params.expires_in {
			tokens = tokens.with_expires_in(OffsetDateTime::now_utc(), expires_in);
		}
		if let (IdentityProvider::Microsoft, Some(profiles)) = (pending.provider, &self.profiles) {
			profiles.enrich(&mut identity, &tokens.access_token).await;
		}

		self.session.set_identity(identity.clone(), tokens).map_err(CallbackRejection::Persistence)?;
		obs::record_callback_stage(CallbackState::IdentityResolved);

		Ok(identity)
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// std
	use std::{sync::atomic::Ordering, time::Duration as StdDuration};
	// crates.io
	use serde_json::json;
	use tokio::time;
	// self
	use super::*;
	use crate::{
		_preludet::*,
		browser::{Location, MemoryLocation},
		config::{AuthConfig, ProviderConfig},
		store::{FaultyStore, KeyValueStore, keys},
	};

	const APP: &str = "https://app.example/tabs/tab1";

	fn config() -> AuthConfig {
		AuthConfig::new(Url::parse(APP).expect("Redirect should parse."))
			.with_google(ProviderConfig::new("google-client").expect("Client id should be valid."))
	}

	fn seed_pending(harness: &TestHarness, state: &str, nonce: &str) {
		harness.transient.set(keys::STATE, state.into()).expect("Seeding should succeed.");
		harness.transient.set(keys::NONCE, nonce.into()).expect("Seeding should succeed.");
		harness.transient.set(keys::PROVIDER, "google".into()).expect("Seeding should succeed.");
	}

	fn build_with_faulty_stores(
		url: &str,
	) -> (ReqwestTestClient, Arc<FaultyStore>, Arc<FaultyStore>, Arc<MemoryLocation>) {
		let local = Arc::new(FaultyStore::default());
		let transient = Arc::new(FaultyStore::default());
		let location =
			Arc::new(MemoryLocation::new(Url::parse(url).expect("Location fixture should parse.")));
		let client = AuthClient::with_http_client(
			&config(),
			local.clone(),
			transient.clone(),
			location.clone(),
			test_reqwest_http_client(),
		)
		.expect("Client should build from the fixture configuration.");

		for (key, value) in [(keys::STATE, "S1"), (keys::NONCE, "N1"), (keys::PROVIDER, "google")] {
			transient.inner.set(key, value.into()).expect("Seeding should succeed.");
		}

		(client, local, transient, location)
	}

	#[test]
	fn fragment_parsing_accepts_both_token_names() {
		let params = CallbackParams::parse(
			"access_token=AT&identityToken=h.p.s&state=S&expires_in=3599&token_type=Bearer",
		);

		assert_eq!(params.access_token, Some(TokenSecret::new("AT")));
		assert_eq!(params.identity_token, Some(TokenSecret::new("h.p.s")));
		assert_eq!(params.state.as_deref(), Some("S"));
		assert_eq!(params.expires_in, Some(Duration::seconds(3599)));
		assert!(params.is_callback());
		assert!(!CallbackParams::parse("/tabs/tab2").is_callback());
		assert!(CallbackParams::parse("error=access_denied&state=S").is_callback());
	}

	#[test]
	fn repeated_fragment_keys_keep_first_value() {
		let params = CallbackParams::parse(
			"access_token=AT1&access_token=AT2&id_token=a.b.c&identityToken=d.e.f&state=&state=S1\
			 &state=S2&expires_in=60&expires_in=120",
		);

		assert_eq!(params.access_token, Some(TokenSecret::new("AT1")));
		assert_eq!(params.identity_token, Some(TokenSecret::new("a.b.c")));
		assert_eq!(params.state.as_deref(), Some("S1"));
		assert_eq!(params.expires_in, Some(Duration::seconds(60)));
	}

	#[tokio::test]
	async fn page_without_fragment_is_idle_and_keeps_pending_request() {
		let harness = build_test_client(&config(), APP);

		seed_pending(&harness, "S1", "N1");

		let outcome = harness.client.handle_redirect_callback().await;

		assert!(matches!(outcome, CallbackOutcome::Idle));
		assert_eq!(harness.transient.len(), 3);
	}

	#[tokio::test]
	async fn callback_runs_once_per_client() {
		let token = fake_id_token(&json!({ "sub": "123" }));
		let harness =
			build_test_client(&config(), &format!("{APP}#access_token=AT1&id_token={token}&state=S1"));

		seed_pending(&harness, "S1", "N1");

		let first = harness.client.handle_redirect_callback().await;

		assert_eq!(first.state(), CallbackState::IdentityResolved);

		harness.location.replace(
			&Url::parse(&format!("{APP}#access_token=AT2&id_token={token}&state=S1"))
				.expect("Fixture should parse."),
		);

		let second = harness.client.handle_redirect_callback().await;

		assert!(matches!(second, CallbackOutcome::Idle));
		assert_eq!(
			harness.client.current_access_token().map(|t| t.expose().to_owned()),
			Some("AT1".into())
		);
	}

	#[tokio::test]
	async fn nonce_mismatch_is_rejected() {
		let token = fake_id_token(&json!({ "sub": "123", "nonce": "other" }));
		let harness =
			build_test_client(&config(), &format!("{APP}#access_token=AT&id_token={token}&state=S1"));

		seed_pending(&harness, "S1", "N1");

		let outcome = harness.client.handle_redirect_callback().await;

		assert!(matches!(outcome.rejection(), Some(CallbackRejection::NonceMismatch)));
		assert_eq!(harness.client.current_identity(), None);
		assert!(harness.transient.is_empty());
		assert_eq!(harness.location.href().fragment(), None);
	}

	#[tokio::test]
	async fn malformed_identity_token_is_rejected() {
		let harness =
			build_test_client(&config(), &format!("{APP}#access_token=AT&id_token=not-a-jwt&state=S1"));

		seed_pending(&harness, "S1", "N1");

		let outcome = harness.client.handle_redirect_callback().await;

		assert!(matches!(
			outcome.rejection(),
			Some(CallbackRejection::Decode(DecodeError::SegmentCount { found: 1 }))
		));
		assert_eq!(harness.client.current_identity(), None);
	}

	#[tokio::test]
	async fn missing_identity_token_is_rejected() {
		let harness = build_test_client(&config(), &format!("{APP}#access_token=AT&state=S1"));

		seed_pending(&harness, "S1", "N1");

		let outcome = harness.client.handle_redirect_callback().await;

		assert!(matches!(outcome.rejection(), Some(CallbackRejection::MissingTokens)));
		assert!(harness.transient.is_empty());
	}

	#[tokio::test]
	async fn matching_nonce_and_expiry_are_accepted() {
		let token = fake_id_token(&json!({ "sub": "123", "nonce": "N1", "email": "a@b.com" }));
		let harness = build_test_client(
			&config(),
			&format!("{APP}#access_token=AT&id_token={token}&state=S1&expires_in=3600"),
		);

		seed_pending(&harness, "S1", "N1");

		let outcome = harness.client.handle_redirect_callback().await;
		let session = harness.client.session().current();
		let tokens = session.tokens().expect("Tokens should be published.");

		assert_eq!(outcome.identity().map(|identity| identity.email.as_str()), Some("a@b.com"));
		assert!(tokens.expires_at.is_some());
		assert!(!tokens.is_expired_at(OffsetDateTime::now_utc()));
		assert_eq!(tokens.identity_token.expose(), token);
	}

	#[tokio::test]
	async fn unreadable_pending_request_is_rejected_and_cleaned_up() {
		let token = fake_id_token(&json!({ "sub": "123" }));
		let (client, _local, transient, location) = build_with_faulty_stores(&format!(
			"{APP}#access_token=AT&id_token={token}&state=S1"
		));

		transient.fail_get.store(true, Ordering::SeqCst);

		let outcome = client.handle_redirect_callback().await;

		assert!(matches!(
			outcome.rejection(),
			Some(CallbackRejection::Persistence(StoreError::Backend { .. }))
		));
		assert_eq!(client.current_identity(), None);
		assert!(transient.inner.is_empty());
		assert_eq!(location.href().fragment(), None);
	}

	#[tokio::test]
	async fn identity_write_failure_publishes_nothing() {
		let token = fake_id_token(&json!({ "sub": "123", "nonce": "N1" }));
		let (client, local, transient, location) = build_with_faulty_stores(&format!(
			"{APP}#access_token=AT&id_token={token}&state=S1"
		));
		let mut watch = client.observe_session();

		watch.next().await.expect("Initial value should be immediate.");
		local.fail_set.store(true, Ordering::SeqCst);

		let outcome = client.handle_redirect_callback().await;

		assert!(matches!(
			outcome.rejection(),
			Some(CallbackRejection::Persistence(StoreError::Backend { .. }))
		));
		assert_eq!(client.current_identity(), None);
		assert_eq!(client.current_access_token(), None);
		assert!(time::timeout(StdDuration::from_millis(50), watch.next()).await.is_err());
		assert!(local.inner.is_empty());
		assert!(transient.inner.is_empty());
		assert_eq!(location.href().fragment(), None);
	}
}
