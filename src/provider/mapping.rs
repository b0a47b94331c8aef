//! Per-provider translation of identity-token claims into an [`Identity`].
//!
//! Each provider names the same facts differently. Google is canonical OIDC (`email`, `name`,
//! `picture`, `sub`); Microsoft may omit `email` in favor of `preferred_username`, omit `name`,
//! and key work accounts by `oid`.

// self
use crate::{
	_prelude::*,
	auth::{Claims, IdentifierError, Identity, IdentityProvider, SubjectId},
};

/// Display name used when a Microsoft token carries no `name` claim.
pub const MICROSOFT_DEFAULT_DISPLAY_NAME: &str = "Microsoft User";

/// Claims could not be turned into an identity.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum MappingError {
	/// No subject claim was present, so the identity has no key.
	#[error("Identity token carries no subject claim.")]
	MissingSubject,
	/// The subject claim is not a usable identifier.
	#[error("Identity token subject is invalid.")]
	InvalidSubject(#[from] IdentifierError),
}

impl IdentityProvider {
	/// Maps decoded claims to a normalized identity using this provider's claim names.
	pub fn map_claims(self, claims: &Claims) -> Result<Identity, MappingError> {
		match self {
			IdentityProvider::Google => map_google(claims),
			IdentityProvider::Microsoft => map_microsoft(claims),
		}
	}
}

fn map_google(claims: &Claims) -> Result<Identity, MappingError> {
	let subject = subject(claims, &["sub"])?;

	Ok(Identity::new(IdentityProvider::Google, subject)
		.with_email(claims.string("email").unwrap_or_default())
		.with_display_name(claims.string("name").unwrap_or_default())
		.with_avatar_url(claims.string("picture").unwrap_or_default()))
}

fn map_microsoft(claims: &Claims) -> Result<Identity, MappingError> {
	let subject = subject(claims, &["sub", "oid"])?;

	Ok(Identity::new(IdentityProvider::Microsoft, subject)
		.with_email(claims.first_string(&["email", "preferred_username"]).unwrap_or_default())
		.with_display_name(claims.string("name").unwrap_or(MICROSOFT_DEFAULT_DISPLAY_NAME)))
}

fn subject(claims: &Claims, names: &[&str]) -> Result<SubjectId, MappingError> {
	let raw = claims.first_string(names).ok_or(MappingError::MissingSubject)?;

	Ok(SubjectId::new(raw)?)
}
