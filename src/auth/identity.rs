//! Provider-agnostic user identity published to session observers.

// self
use crate::{_prelude::*, auth::SubjectId};

/// Identity providers supported by the implicit flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityProvider {
	/// Google accounts (`accounts.google.com`).
	Google,
	/// Microsoft identity platform (`login.microsoftonline.com`, `common` tenant).
	Microsoft,
}
impl IdentityProvider {
	/// Every supported provider, in a stable order.
	pub const ALL: [IdentityProvider; 2] = [IdentityProvider::Google, IdentityProvider::Microsoft];

	/// Returns the stable lowercase label used in storage and logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			IdentityProvider::Google => "google",
			IdentityProvider::Microsoft => "microsoft",
		}
	}
}
impl Display for IdentityProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for IdentityProvider {
	type Err = UnknownProviderError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|provider| provider.as_str() == s)
			.ok_or_else(|| UnknownProviderError { label: s.to_owned() })
	}
}

/// Raised when a stored or configured provider label is not recognized.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown identity provider label `{label}`.")]
pub struct UnknownProviderError {
	/// Label that failed to parse.
	pub label: String,
}

/// Normalized identity derived from a provider's identity-token claims.
///
/// `provider` + `subject` form the unique key. Claims that a token omits default to empty
/// strings. The serialized form is what the session store persists across reloads.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
	/// Provider that asserted the identity.
	pub provider: IdentityProvider,
	/// Stable per-provider user identifier.
	pub subject: SubjectId,
	/// Email address, possibly empty.
	#[serde(default)]
	pub email: String,
	/// Human-readable name, possibly empty.
	#[serde(default)]
	pub display_name: String,
	/// Profile picture URL, possibly empty.
	#[serde(default)]
	pub avatar_url: String,
}
impl Identity {
	/// Creates an identity with empty profile fields.
	pub fn new(provider: IdentityProvider, subject: SubjectId) -> Self {
		Self {
			provider,
			subject,
			email: String::new(),
			display_name: String::new(),
			avatar_url: String::new(),
		}
	}

	/// Sets the email address.
	pub fn with_email(mut self, email: impl Into<String>) -> Self {
		self.email = email.into();

		self
	}

	/// Sets the display name.
	pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
		self.display_name = display_name.into();

		self
	}

	/// Sets the avatar URL.
	pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
		self.avatar_url = avatar_url.into();

		self
	}

	/// Returns the `(provider, subject)` key that uniquely identifies this user.
	pub fn key(&self) -> IdentityKey {
		IdentityKey { provider: self.provider, subject: self.subject.clone() }
	}
}

/// Unique key of an [`Identity`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityKey {
	/// Provider component.
	pub provider: IdentityProvider,
	/// Subject component.
	pub subject: SubjectId,
}
impl Display for IdentityKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}:{}", self.provider, self.subject)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn subject(value: &str) -> SubjectId {
		SubjectId::new(value).expect("Subject fixture should be valid.")
	}

	#[test]
	fn provider_labels_round_trip() {
		for provider in IdentityProvider::ALL {
			assert_eq!(provider.as_str().parse::<IdentityProvider>(), Ok(provider));
		}

		assert!("github".parse::<IdentityProvider>().is_err());
		assert!("Google".parse::<IdentityProvider>().is_err(), "Labels are case-sensitive.");
	}

	#[test]
	fn identity_serializes_with_camel_case_fields() {
		let identity = Identity::new(IdentityProvider::Google, subject("123"))
			.with_email("a@b.com")
			.with_display_name("A");
		let value = serde_json::to_value(&identity).expect("Identity should serialize.");

		assert_eq!(
			value,
			serde_json::json!({
				"provider": "google",
				"subject": "123",
				"email": "a@b.com",
				"displayName": "A",
				"avatarUrl": "",
			})
		);

		let decoded: Identity = serde_json::from_value(value).expect("Identity should deserialize.");

		assert_eq!(decoded, identity);
	}

	#[test]
	fn identity_key_ignores_profile_fields() {
		let lhs = Identity::new(IdentityProvider::Microsoft, subject("oid-1")).with_email("x@y.z");
		let rhs = Identity::new(IdentityProvider::Microsoft, subject("oid-1"));
		let other = Identity::new(IdentityProvider::Google, subject("oid-1"));

		assert_eq!(lhs.key(), rhs.key());
		assert_ne!(lhs.key(), other.key());
		assert_eq!(lhs.key().to_string(), "microsoft:oid-1");
	}
}
