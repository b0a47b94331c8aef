//! Client configuration: redirect URI, per-provider client registrations, and enrichment.
//!
//! Configuration is usually loaded from JSON with [`AuthConfig::from_json_str`], which reports
//! the exact path of a malformed field:
//!
//! ```json
//! {
//!   "redirect_uri": "https://app.example/tabs/tab1",
//!   "google": { "client_id": "1234.apps.googleusercontent.com" },
//!   "microsoft": { "client_id": "00000000-0000-0000-0000-000000000000", "scopes": "openid profile" }
//! }
//! ```

// self
use crate::{
	_prelude::*,
	auth::{ClientId, IdentityProvider, ScopeSet},
	error::ConfigError,
	profile::GRAPH_BASE_URL,
	provider::ProviderDescriptor,
};

/// Registration for one identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
	/// Public client identifier issued by the provider.
	pub client_id: ClientId,
	/// Scopes to request instead of the provider defaults.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scopes: Option<ScopeSet>,
	/// Authorization endpoint override (HTTPS only), e.g. a tenant-specific Microsoft URL.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub authorization_endpoint: Option<Url>,
}
impl ProviderConfig {
	/// Creates a registration using the provider's default scopes and endpoint.
	pub fn new(client_id: impl AsRef<str>) -> Result<Self, ConfigError> {
		Ok(Self { client_id: ClientId::new(client_id)?, scopes: None, authorization_endpoint: None })
	}

	/// Overrides the requested scopes.
	pub fn with_scopes<I, S>(mut self, scopes: I) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = Some(ScopeSet::new(scopes)?);

		Ok(self)
	}

	/// Overrides the authorization endpoint.
	pub fn with_authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	fn descriptor(&self, provider: IdentityProvider) -> Result<ProviderDescriptor, ConfigError> {
		let preset = ProviderDescriptor::preset(provider, self.client_id.clone())?;

		if self.scopes.is_none() && self.authorization_endpoint.is_none() {
			return Ok(preset);
		}

		let descriptor = ProviderDescriptor::builder(provider, preset.client_id)
			.authorization_endpoint(
				self.authorization_endpoint.clone().unwrap_or(preset.endpoints.authorization),
			)
			.default_scopes(self.scopes.clone().unwrap_or(preset.default_scopes))
			.quirks(preset.quirks)
			.build()?;

		Ok(descriptor)
	}
}

/// Top-level client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
	/// URI the providers redirect back to; must be registered with each provider.
	pub redirect_uri: Url,
	/// Google registration, if Google sign-in is offered.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub google: Option<ProviderConfig>,
	/// Microsoft registration, if Microsoft sign-in is offered.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub microsoft: Option<ProviderConfig>,
	/// Microsoft Graph base URL override; defaults to [`GRAPH_BASE_URL`].
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub graph_base_url: Option<Url>,
	/// Whether Microsoft identities are enriched from Graph before publishing.
	#[serde(default = "enrich_profiles_default")]
	pub enrich_profiles: bool,
}
impl AuthConfig {
	/// Creates a configuration with no providers and enrichment enabled.
	pub fn new(redirect_uri: Url) -> Self {
		Self {
			redirect_uri,
			google: None,
			microsoft: None,
			graph_base_url: None,
			enrich_profiles: enrich_profiles_default(),
		}
	}

	/// Parses and validates a JSON document.
	pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
		let mut deserializer = serde_json::Deserializer::from_str(json);
		let config: Self = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ConfigError::Parse { source })?;

		config.validate()?;

		Ok(config)
	}

	/// Adds the Google registration.
	pub fn with_google(mut self, provider: ProviderConfig) -> Self {
		self.google = Some(provider);

		self
	}

	/// Adds the Microsoft registration.
	pub fn with_microsoft(mut self, provider: ProviderConfig) -> Self {
		self.microsoft = Some(provider);

		self
	}

	/// Points Graph lookups at another base URL.
	pub fn with_graph_base_url(mut self, url: Url) -> Self {
		self.graph_base_url = Some(url);

		self
	}

	/// Enables or disables Graph enrichment.
	pub fn with_profile_enrichment(mut self, enabled: bool) -> Self {
		self.enrich_profiles = enabled;

		self
	}

	/// Registration for `provider`, if configured.
	pub fn provider(&self, provider: IdentityProvider) -> Option<&ProviderConfig> {
		match provider {
			IdentityProvider::Google => self.google.as_ref(),
			IdentityProvider::Microsoft => self.microsoft.as_ref(),
		}
	}

	/// Checks the redirect URI scheme and that at least one provider is configured.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if !matches!(self.redirect_uri.scheme(), "http" | "https") {
			return Err(ConfigError::InvalidRedirect { url: self.redirect_uri.to_string() });
		}
		if self.google.is_none() && self.microsoft.is_none() {
			return Err(ConfigError::NoProviders);
		}

		Ok(())
	}

	/// Builds validated descriptors for every configured provider.
	pub fn descriptors(&self) -> Result<BTreeMap<IdentityProvider, ProviderDescriptor>, ConfigError> {
		self.validate()?;

		let mut descriptors = BTreeMap::new();

		for provider in IdentityProvider::ALL {
			if let Some(config) = self.provider(provider) {
				descriptors.insert(provider, config.descriptor(provider)?);
			}
		}

		Ok(descriptors)
	}

	/// Resolved Graph base URL.
	pub fn graph_base_url(&self) -> Result<Url, ConfigError> {
		match &self.graph_base_url {
			Some(url) => Ok(url.clone()),
			None => Url::parse(GRAPH_BASE_URL).map_err(ConfigError::invalid_url),
		}
	}
}

fn enrich_profiles_default() -> bool {
	true
}
