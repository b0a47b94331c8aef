//! Internal OAuth client facade used to serialize implicit-flow authorization requests.

pub use oauth2;

// crates.io
use oauth2::{
	AuthUrl, ClientId as OAuthClientId, CsrfToken, EndpointNotSet, EndpointSet, RedirectUrl,
	ResponseType, Scope, basic::BasicClient,
};
// self
use crate::{_prelude::*, auth::ScopeSet, provider::ProviderDescriptor};

type AuthorizeOnlyClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet>;

/// Authorization request facade bound to one provider descriptor and redirect URI.
pub(crate) struct AuthorizeFacade {
	oauth_client: AuthorizeOnlyClient,
	descriptor: ProviderDescriptor,
}
impl AuthorizeFacade {
	pub(crate) fn from_descriptor(descriptor: &ProviderDescriptor, redirect_uri: &Url) -> Self {
		let oauth_client = BasicClient::new(OAuthClientId::new(descriptor.client_id.to_string()))
			.set_auth_uri(AuthUrl::from_url(descriptor.endpoints.authorization.clone()))
			.set_redirect_uri(RedirectUrl::from_url(redirect_uri.clone()));

		Self { oauth_client, descriptor: descriptor.clone() }
	}

	/// Serializes the authorization URL carrying `state`, `nonce`, and the provider quirks.
	///
	/// Parameter order is `response_type`, `client_id`, `state`, `redirect_uri`, `scope`, then
	/// `nonce`, `response_mode`, and `prompt`.
	pub(crate) fn authorize_url(&self, scope: &ScopeSet, state: &str, nonce: &str) -> Url {
		let quirks = &self.descriptor.quirks;
		let mut request = self
			.oauth_client
			.authorize_url(|| CsrfToken::new(state.to_owned()))
			.set_response_type(&ResponseType::new(quirks.response_type.clone()))
			.add_scopes(scope.iter().map(|scope| Scope::new(scope.to_owned())))
			.add_extra_param("nonce", nonce);

		if let Some(mode) = quirks.response_mode.as_deref() {
			request = request.add_extra_param("response_mode", mode);
		}
		if let Some(prompt) = quirks.prompt.as_deref() {
			request = request.add_extra_param("prompt", prompt);
		}

		let (url, _) = request.url();

		url
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::ClientId;

	fn query(url: &Url) -> Vec<(String, String)> {
		url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect()
	}

	#[test]
	fn google_authorize_url_carries_every_parameter() {
		let descriptor = ProviderDescriptor::google(
			ClientId::new("google-client").expect("Client fixture should be valid."),
		)
		.expect("Google preset should build.");
		let redirect = Url::parse("https://app.example/tabs/tab1").expect("Redirect should parse.");
		let facade = AuthorizeFacade::from_descriptor(&descriptor, &redirect);
		let url = facade.authorize_url(&descriptor.default_scopes, "S1", "N1");

		assert_eq!(url.host_str(), Some("accounts.google.com"));
		assert_eq!(url.path(), "/o/oauth2/v2/auth");
		assert_eq!(query(&url), vec![
			("response_type".into(), "token id_token".into()),
			("client_id".into(), "google-client".into()),
			("state".into(), "S1".into()),
			("redirect_uri".into(), "https://app.example/tabs/tab1".into()),
			("scope".into(), "openid email profile".into()),
			("nonce".into(), "N1".into()),
			("prompt".into(), "select_account".into()),
		]);
	}

	#[test]
	fn microsoft_authorize_url_requests_fragment_mode() {
		let descriptor = ProviderDescriptor::microsoft(
			ClientId::new("ms-client").expect("Client fixture should be valid."),
		)
		.expect("Microsoft preset should build.");
		let redirect = Url::parse("https://app.example/").expect("Redirect should parse.");
		let url = AuthorizeFacade::from_descriptor(&descriptor, &redirect).authorize_url(
			&descriptor.default_scopes,
			"S",
			"N",
		);
		let pairs = query(&url);

		assert!(pairs.contains(&("response_type".into(), "id_token token".into())));
		assert!(pairs.contains(&("response_mode".into(), "fragment".into())));
		assert!(pairs.contains(&("scope".into(), "openid profile email User.Read".into())));
	}
}
