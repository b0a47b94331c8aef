//! Structural decoding of compact identity tokens (`header.payload.signature`).
//!
//! Decoding base64url-decodes the payload segment and parses it as a JSON object. The
//! signature is never checked, so decoded claims are provider-asserted but unverified.
//! Payload bytes are parsed as UTF-8 JSON directly, which recovers multi-byte characters in
//! claim values without any intermediate escaping.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Map, Value};
// self
use crate::_prelude::*;

const SEGMENT_COUNT: usize = 3;

/// Malformed identity token.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Token does not have exactly three dot-separated segments.
	#[error("Identity token must have 3 segments, found {found}.")]
	SegmentCount {
		/// Number of segments present.
		found: usize,
	},
	/// Payload segment is not valid base64url.
	#[error("Identity token payload is not valid base64url.")]
	Base64(#[from] base64::DecodeError),
	/// Payload is not valid UTF-8 JSON.
	#[error("Identity token payload is not valid JSON.")]
	Json(#[from] serde_json::Error),
	/// Payload parsed, but is not a JSON object.
	#[error("Identity token payload is not a JSON object.")]
	NotAnObject,
}

/// Claims carried by an identity token payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);
impl Claims {
	/// Decodes the payload of a compact token without verifying its signature.
	pub fn decode(token: &str) -> Result<Self, DecodeError> {
		let segments = token.split('.').collect::<Vec<_>>();

		if segments.len() != SEGMENT_COUNT {
			return Err(DecodeError::SegmentCount { found: segments.len() });
		}

		let bytes = URL_SAFE_NO_PAD.decode(segments[1].trim_end_matches('='))?;

		match serde_json::from_slice::<Value>(&bytes)? {
			Value::Object(map) => Ok(Self(map)),
			_ => Err(DecodeError::NotAnObject),
		}
	}

	/// Returns the raw claim value.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.0.get(name)
	}

	/// Returns the claim as a string when it is a non-empty JSON string.
	pub fn string(&self, name: &str) -> Option<&str> {
		self.0.get(name).and_then(Value::as_str).filter(|value| !value.is_empty())
	}

	/// Returns the first of `names` that resolves to a non-empty string claim.
	pub fn first_string(&self, names: &[&str]) -> Option<&str> {
		names.iter().find_map(|name| self.string(name))
	}

	/// Number of claims.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true when the payload carried no claims.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Borrows the underlying JSON object.
	pub fn as_map(&self) -> &Map<String, Value> {
		&self.0
	}

	/// Consumes the claims, returning the underlying JSON object.
	pub fn into_map(self) -> Map<String, Value> {
		self.0
	}
}
impl From<Map<String, Value>> for Claims {
	fn from(value: Map<String, Value>) -> Self {
		Self(value)
	}
}
