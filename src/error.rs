//! Crate-level error types shared by configuration, storage, and sign-in entry points.
//!
//! Failures inside redirect-callback processing never surface here; they terminate in
//! [`CallbackOutcome::Rejected`](crate::flows::CallbackOutcome::Rejected) instead.

// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, IdentityProvider, RandomError, ScopeValidationError},
	provider::ProviderDescriptorError,
};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The secure random source failed; sign-in cannot proceed without it.
	#[error(transparent)]
	Random(#[from] RandomError),

	/// Sign-in was requested for a provider that has no configuration.
	#[error("Provider `{provider}` is not configured.")]
	UnknownProvider {
		/// Provider requested by the caller.
		provider: IdentityProvider,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Configuration document could not be parsed.
	#[error("Configuration is invalid at `{}`.", source.path())]
	Parse {
		/// Path-annotated parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A built-in or configured URL failed to parse.
	#[error("Configured URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Redirect URI uses a scheme the providers will not redirect to.
	#[error("Redirect URI must use http or https: {url}.")]
	InvalidRedirect {
		/// Offending redirect URI.
		url: String,
	},
	/// Neither Google nor Microsoft is configured.
	#[error("At least one identity provider must be configured.")]
	NoProviders,

	/// Provider descriptor failed validation.
	#[error(transparent)]
	InvalidDescriptor(#[from] ProviderDescriptorError),
	/// Configured scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] ScopeValidationError),
	/// Configured client identifier is malformed.
	#[error("Client identifier is invalid.")]
	InvalidClientId(#[from] IdentifierError),
}
impl ConfigError {
	/// Wraps a URL parsing failure.
	pub fn invalid_url(source: url::ParseError) -> Self {
		Self::InvalidUrl { source }
	}
}
