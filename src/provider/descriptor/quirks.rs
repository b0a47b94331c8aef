// self
use crate::_prelude::*;

/// Provider-specific quirks that shape the authorization request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// `response_type` value, space-delimited in the order the provider documents.
	pub response_type: String,
	/// Optional `response_mode` parameter; `None` leaves it to the provider default.
	pub response_mode: Option<String>,
	/// Optional `prompt` parameter forcing the account chooser.
	pub prompt: Option<String>,
}
impl ProviderQuirks {
	/// Returns true when `response_type` asks for both an access token and an identity token.
	pub fn requests_both_tokens(&self) -> bool {
		let (mut token, mut id_token) = (false, false);

		for part in self.response_type.split_whitespace() {
			match part {
				"token" => token = true,
				"id_token" => id_token = true,
				_ => return false,
			}
		}

		token && id_token
	}
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self {
			response_type: "token id_token".into(),
			response_mode: None,
			prompt: Some("select_account".into()),
		}
	}
}
