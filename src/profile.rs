//! Best-effort Microsoft Graph profile enrichment.
//!
//! Microsoft identity tokens carry no picture claim, so after the claims are mapped the client
//! asks Graph for the signed-in user's profile and photo using the fresh access token. Every
//! failure here is classified as an [`EnrichmentFailure`], logged, and swallowed; enrichment
//! never decides whether sign-in succeeds.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use oauth2::{
	AsyncHttpClient, HttpRequest, HttpResponse,
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::{Identity, TokenSecret},
	http::HttpTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::MICROSOFT_DEFAULT_DISPLAY_NAME,
};

/// Default Microsoft Graph base URL.
pub const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

const FALLBACK_PHOTO_CONTENT_TYPE: &str = "image/jpeg";

/// Reasons a profile lookup produced nothing usable.
#[derive(Debug, ThisError)]
pub enum EnrichmentFailure {
	/// Graph endpoint URL could not be derived from the base URL.
	#[error("Graph endpoint URL is invalid.")]
	Url(#[from] url::ParseError),
	/// HTTP request could not be assembled.
	#[error("Graph request could not be built: {message}.")]
	Request {
		/// Builder message.
		message: String,
	},
	/// The transport failed before a response arrived.
	#[error("Graph transport failed: {message}.")]
	Transport {
		/// Transport message.
		message: String,
	},
	/// Graph answered with a non-success status.
	#[error("Graph returned HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
	},
	/// The response body was not what the endpoint documents.
	#[error("Graph response is invalid: {message}.")]
	Payload {
		/// Parse message.
		message: String,
	},
}

/// Subset of the Graph `/me` resource used to fill gaps in token claims.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphProfile {
	/// Display name.
	#[serde(default)]
	pub display_name: Option<String>,
	/// Primary SMTP address; absent for many personal accounts.
	#[serde(default)]
	pub mail: Option<String>,
	/// Sign-in name, usually an email-shaped string.
	#[serde(default)]
	pub user_principal_name: Option<String>,
}
impl GraphProfile {
	/// First non-empty email-like value.
	pub fn email(&self) -> Option<&str> {
		[self.mail.as_deref(), self.user_principal_name.as_deref()]
			.into_iter()
			.flatten()
			.find(|value| !value.is_empty())
	}
}

/// Fetches Graph profile data with a bearer access token.
pub struct ProfileFetcher<C>
where
	C: ?Sized + HttpTransport,
{
	http: Arc<C>,
	base: Url,
}
impl<C> ProfileFetcher<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a fetcher rooted at `base` (for example [`GRAPH_BASE_URL`]).
	pub fn new(http: impl Into<Arc<C>>, mut base: Url) -> Self {
		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());

			base.set_path(&path);
		}

		Self { http: http.into(), base }
	}

	/// Base URL every Graph path is resolved against.
	pub fn base_url(&self) -> &Url {
		&self.base
	}

	/// Fills gaps in `identity` from Graph; failures leave the identity untouched.
	///
	/// An empty email is replaced by the profile's `mail` or `userPrincipalName`, a missing or
	/// default display name by the profile's `displayName`, and an empty avatar by the photo.
	pub async fn enrich(&self, identity: &mut Identity, access_token: &TokenSecret) {
		let span = FlowSpan::new(FlowKind::Enrichment, "enrich");

		span.instrument(async move {
			obs::record_flow_outcome(FlowKind::Enrichment, FlowOutcome::Attempt);

			let profile = self.fetch_profile(access_token).await;
			let failed = profile.is_err();

			match profile {
				Ok(profile) => apply_profile(identity, &profile),
				Err(e) => obs::record_enrichment_failure(&e),
			}

			if identity.avatar_url.is_empty() {
				identity.avatar_url = self.fetch_avatar(access_token).await;
			}

			let outcome = if failed { FlowOutcome::Failure } else { FlowOutcome::Success };

			obs::record_flow_outcome(FlowKind::Enrichment, outcome);
		})
		.await
	}

	/// Returns the profile photo as a `data:` URL, or an empty string on any failure.
	pub async fn fetch_avatar(&self, access_token: &TokenSecret) -> String {
		match self.fetch_photo(access_token).await {
			Ok(url) => url,
			Err(e) => {
				obs::record_enrichment_failure(&e);

				String::new()
			},
		}
	}

	/// Fetches `GET {base}/me`.
	pub async fn fetch_profile(
		&self,
		access_token: &TokenSecret,
	) -> Result<GraphProfile, EnrichmentFailure> {
		let response = self.get("me", "application/json", access_token).await?;

		serde_json::from_slice(response.body())
			.map_err(|e| EnrichmentFailure::Payload { message: e.to_string() })
	}

	/// Fetches `GET {base}/me/photo/$value` and encodes it as `data:<type>;base64,<bytes>`.
	pub async fn fetch_photo(&self, access_token: &TokenSecret) -> Result<String, EnrichmentFailure> {
		let response = self.get("me/photo/$value", "image/*", access_token).await?;
		let body = response.body();

		if body.is_empty() {
			return Err(EnrichmentFailure::Payload { message: "photo body is empty".into() });
		}

		let content_type = response
			.headers()
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.map(|value| value.split(';').next().unwrap_or(value).trim())
			.filter(|value| !value.is_empty())
			.unwrap_or(FALLBACK_PHOTO_CONTENT_TYPE);

		Ok(format!("data:{content_type};base64,{}", STANDARD.encode(body)))
	}

	async fn get(
		&self,
		path: &str,
		accept: &str,
		access_token: &TokenSecret,
	) -> Result<HttpResponse, EnrichmentFailure> {
		let url = self.base.join(path)?;
		let request: HttpRequest = Request::builder()
			.method(Method::GET)
			.uri(url.as_str())
			.header(AUTHORIZATION, format!("Bearer {}", access_token.expose()))
			.header(ACCEPT, accept)
			.body(Vec::new())
			.map_err(|e| EnrichmentFailure::Request { message: e.to_string() })?;
		let handle = self.http.handle();
		let response = handle
			.call(request)
			.await
			.map_err(|e| EnrichmentFailure::Transport { message: e.to_string() })?;

		if !response.status().is_success() {
			return Err(EnrichmentFailure::Status { status: response.status().as_u16() });
		}

		Ok(response)
	}
}
impl<C> Debug for ProfileFetcher<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProfileFetcher").field("base", &self.base.as_str()).finish()
	}
}

fn apply_profile(identity: &mut Identity, profile: &GraphProfile) {
	if identity.email.is_empty() {
		identity.email = profile.email().unwrap_or_default().to_owned();
	}

	let display_name_missing =
		identity.display_name.is_empty() || identity.display_name == MICROSOFT_DEFAULT_DISPLAY_NAME;
	let profile_name = profile.display_name.as_deref().filter(|name| !name.is_empty());

	if let (true, Some(name)) = (display_name_missing, profile_name) {
		identity.display_name = name.to_owned();
	}
}
