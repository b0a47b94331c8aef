//! Memory-only token material returned by the implicit flow.

// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
///
/// Secrets are intentionally not serializable; they live only in memory for the lifetime of
/// the page load that received them.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Access + identity token pair obtained from one successful callback.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionTokens {
	/// Bearer token for provider APIs.
	pub access_token: TokenSecret,
	/// Compact identity token the published identity was derived from.
	pub identity_token: TokenSecret,
	/// Access-token expiry derived from the fragment's `expires_in`, when present.
	pub expires_at: Option<OffsetDateTime>,
}
impl SessionTokens {
	/// Pairs the two tokens without an expiry hint.
	pub fn new(access_token: TokenSecret, identity_token: TokenSecret) -> Self {
		Self { access_token, identity_token, expires_at: None }
	}

	/// Records an expiry `expires_in` after `issued_at`.
	pub fn with_expires_in(mut self, issued_at: OffsetDateTime, expires_in: Duration) -> Self {
		self.expires_at = issued_at.checked_add(expires_in);

		self
	}

	/// Returns true when the access token is known to be expired at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}
}
impl Debug for SessionTokens {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionTokens")
			.field("access_token", &"<redacted>")
			.field("identity_token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.expose(), "super-secret");
	}

	#[test]
	fn session_tokens_track_expiry() {
		let issued = macros::datetime!(2025-11-10 12:00 UTC);
		let tokens = SessionTokens::new(TokenSecret::new("at"), TokenSecret::new("it"))
			.with_expires_in(issued, Duration::seconds(3599));

		assert_eq!(tokens.expires_at, Some(macros::datetime!(2025-11-10 12:59:59 UTC)));
		assert!(!tokens.is_expired_at(issued));
		assert!(tokens.is_expired_at(issued + Duration::hours(1)));
		assert!(!format!("{tokens:?}").contains("\"at\""));

		let open_ended = SessionTokens::new(TokenSecret::new("at"), TokenSecret::new("it"));

		assert!(!open_ended.is_expired_at(issued + Duration::days(365)));
	}
}
