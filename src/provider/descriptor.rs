//! Provider descriptor data structures and the built-in Google and Microsoft presets.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Provider-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use quirks::*;

// self
use crate::{
	_prelude::*,
	auth::{ClientId, IdentityProvider, ScopeSet},
};

/// Google's OAuth 2.0 authorization endpoint.
pub const GOOGLE_AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// Microsoft identity platform authorization endpoint (`common` tenant).
pub const MICROSOFT_AUTHORIZATION_ENDPOINT: &str =
	"https://login.microsoftonline.com/common/oauth2/v2.0/authorize";
/// Scopes requested from Google when none are configured.
pub const GOOGLE_DEFAULT_SCOPES: [&str; 3] = ["openid", "email", "profile"];
/// Scopes requested from Microsoft when none are configured.
pub const MICROSOFT_DEFAULT_SCOPES: [&str; 4] = ["openid", "profile", "email", "User.Read"];

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint the browser is sent to.
	pub authorization: Url,
}

/// Immutable provider descriptor consumed by the sign-in flow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Provider tag; selects the claim mapping used on the way back.
	pub provider: IdentityProvider,
	/// Public client identifier registered with the provider.
	pub client_id: ClientId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Scopes requested when the caller does not override them.
	pub default_scopes: ScopeSet,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided provider and client.
	pub fn builder(provider: IdentityProvider, client_id: ClientId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(provider, client_id)
	}

	/// Preset for Google: `response_type=token id_token` with an account chooser.
	pub fn google(client_id: ClientId) -> Result<Self, ProviderDescriptorError> {
		Self::builder(IdentityProvider::Google, client_id)
			.authorization_endpoint(parse_endpoint(GOOGLE_AUTHORIZATION_ENDPOINT)?)
			.default_scopes(preset_scopes(&GOOGLE_DEFAULT_SCOPES)?)
			.quirks(ProviderQuirks::default())
			.build()
	}

	/// Preset for Microsoft: `response_type=id_token token`, `response_mode=fragment`, and an
	/// account chooser.
	pub fn microsoft(client_id: ClientId) -> Result<Self, ProviderDescriptorError> {
		Self::builder(IdentityProvider::Microsoft, client_id)
			.authorization_endpoint(parse_endpoint(MICROSOFT_AUTHORIZATION_ENDPOINT)?)
			.default_scopes(preset_scopes(&MICROSOFT_DEFAULT_SCOPES)?)
			.quirks(ProviderQuirks {
				response_type: "id_token token".into(),
				response_mode: Some("fragment".into()),
				..ProviderQuirks::default()
			})
			.build()
	}

	/// Preset selected by provider tag.
	pub fn preset(
		provider: IdentityProvider,
		client_id: ClientId,
	) -> Result<Self, ProviderDescriptorError> {
		match provider {
			IdentityProvider::Google => Self::google(client_id),
			IdentityProvider::Microsoft => Self::microsoft(client_id),
		}
	}
}

fn parse_endpoint(url: &str) -> Result<Url, ProviderDescriptorError> {
	Url::parse(url).map_err(|e| ProviderDescriptorError::InvalidEndpoint {
		url: url.to_owned(),
		message: e.to_string(),
	})
}

fn preset_scopes(scopes: &[&str]) -> Result<ScopeSet, ProviderDescriptorError> {
	ScopeSet::new(scopes.iter().copied())
		.map_err(|e| ProviderDescriptorError::InvalidDefaultScopes { message: e.to_string() })
}
