//! Access and refresh token values.

// self
use crate::_prelude::*;

/// Token value kept out of `Debug` output.
///
/// Serializes as the bare string so stored credentials keep the token endpoint's shape.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a token value.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Reads a token member of a token endpoint payload.
	///
	/// Only non-blank strings count; `null`, numbers and `""` read as absent.
	pub fn from_member(payload: &JsonMap<String, JsonValue>, name: &str) -> Option<Self> {
		payload
			.get(name)
			.and_then(JsonValue::as_str)
			.filter(|value| !value.trim().is_empty())
			.map(Self::new)
	}

	/// Token text for headers, query strings and `$oauth2` variables.
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
		write!(f, "TokenSecret(<{} chars>)", self.0.chars().count())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn debug_hides_the_value() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(<12 chars>)");
		assert_eq!(
			serde_json::to_string(&secret).expect("Secret should serialize."),
			"\"super-secret\""
		);
	}

	#[test]
	fn blank_and_non_string_members_are_absent() {
		let payload = serde_json::json!({
			"access_token": "a",
			"refresh_token": "  ",
			"id_token": null,
			"expires_in": 60,
		});
		let payload = payload.as_object().expect("Fixture should be an object.");

		assert_eq!(TokenSecret::from_member(payload, "access_token"), Some(TokenSecret::new("a")));
		assert_eq!(TokenSecret::from_member(payload, "refresh_token"), None);
		assert_eq!(TokenSecret::from_member(payload, "id_token"), None);
		assert_eq!(TokenSecret::from_member(payload, "expires_in"), None);
	}
}
