// self
use crate::{
	_prelude::*,
	auth::{ClientId, IdentityProvider, ScopeSet},
	provider::{ProviderDescriptor, ProviderEndpoints, ProviderQuirks},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ProviderDescriptorError {
	/// Authorization endpoint is required.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// Endpoint string could not be parsed.
	#[error("Endpoint `{url}` is not a valid URL: {message}.")]
	InvalidEndpoint {
		/// Raw endpoint value.
		url: String,
		/// Parser message.
		message: String,
	},
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Built-in default scopes failed validation.
	#[error("Default scopes are invalid: {message}.")]
	InvalidDefaultScopes {
		/// Validation message.
		message: String,
	},
	/// The implicit flow needs both tokens in the fragment.
	#[error("Response type `{response_type}` must request exactly `token` and `id_token`.")]
	IncompleteResponseType {
		/// Offending `response_type` value.
		response_type: String,
	},
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Provider tag for the descriptor being constructed.
	pub provider: IdentityProvider,
	/// Public client identifier.
	pub client_id: ClientId,
	/// Authorization endpoint.
	pub authorization_endpoint: Option<Url>,
	/// Scopes requested by default.
	pub default_scopes: ScopeSet,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provider tag and client identifier.
	pub fn new(provider: IdentityProvider, client_id: ClientId) -> Self {
		Self {
			provider,
			client_id,
			authorization_endpoint: None,
			default_scopes: ScopeSet::default(),
			quirks: ProviderQuirks::default(),
		}
	}

	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the default scopes.
	pub fn default_scopes(mut self, scopes: ScopeSet) -> Self {
		self.default_scopes = scopes;

		self
	}

	/// Overrides the provider quirks.
	pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let authorization = self
			.authorization_endpoint
			.ok_or(ProviderDescriptorError::MissingAuthorizationEndpoint)?;
		let descriptor = ProviderDescriptor {
			provider: self.provider,
			client_id: self.client_id,
			endpoints: ProviderEndpoints { authorization },
			default_scopes: self.default_scopes,
			quirks: self.quirks,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_endpoint("authorization", &self.endpoints.authorization)?;

		if !self.quirks.requests_both_tokens() {
			return Err(ProviderDescriptorError::IncompleteResponseType {
				response_type: self.quirks.response_type.clone(),
			});
		}

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	if url.scheme() != "https" {
		Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}
