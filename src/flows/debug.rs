//! Diagnostic trail of token endpoint calls.
//!
//! Every call made while acquiring or refreshing credentials appends one [`DebugEntry`], including
//! calls that failed at the network level. The trail is handed back to the caller on success,
//! on rejection, and inside [`Error::TokenEndpoint`].

// self
use crate::_prelude::*;

/// Ordered list of token endpoint calls.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugTrail {
	/// Calls in the order they were made.
	pub entries: Vec<DebugEntry>,
}
impl DebugTrail {
	/// Appends a call.
	pub fn push(&mut self, entry: DebugEntry) {
		self.entries.push(entry);
	}

	/// Number of recorded calls.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns `true` when no call was recorded.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Most recent call.
	pub fn last(&self) -> Option<&DebugEntry> {
		self.entries.last()
	}
}

/// One request/response pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugEntry {
	/// Random identifier of the call.
	pub request_id: String,
	/// What was sent.
	pub request: DebugRequest,
	/// What came back.
	pub response: DebugResponse,
}

/// Outbound half of a [`DebugEntry`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugRequest {
	/// Final URL including query parameters.
	pub url: String,
	/// HTTP method.
	pub method: String,
	/// Headers in send order.
	pub headers: Vec<(String, String)>,
	/// Form-encoded body.
	pub body: String,
}
impl DebugRequest {
	/// Decoded form body as name/value pairs.
	pub fn form(&self) -> Vec<(String, String)> {
		url::form_urlencoded::parse(self.body.as_bytes())
			.map(|(name, value)| (name.into_owned(), value.into_owned()))
			.collect()
	}

	/// First form value named `name`.
	pub fn form_value(&self, name: &str) -> Option<String> {
		self.form().into_iter().find(|(key, _)| key == name).map(|(_, value)| value)
	}

	/// First header named `name`, compared case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

/// Inbound half of a [`DebugEntry`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugResponse {
	/// URL the response came from.
	pub url: String,
	/// HTTP status; absent when the call failed before a response arrived.
	pub status: Option<u16>,
	/// Canonical reason phrase for `status`.
	pub status_text: Option<String>,
	/// Response headers.
	pub headers: Vec<(String, String)>,
	/// Parsed JSON body, or the raw text when it is not JSON.
	pub body: Option<JsonValue>,
	/// Time until the body was read.
	pub elapsed_ms: Option<u64>,
	/// Transport failure summary.
	pub error: Option<String>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn request_helpers_decode_form_and_headers() {
		let request = DebugRequest {
			url: "https://idp.test/token".into(),
			method: "POST".into(),
			headers: vec![("Authorization".into(), "Basic abc".into())],
			body: "grant_type=client_credentials&scope=read+write".into(),
		};

		assert_eq!(request.form_value("scope").as_deref(), Some("read write"));
		assert_eq!(request.form_value("client_id"), None);
		assert_eq!(request.header("authorization"), Some("Basic abc"));
	}

	#[test]
	fn trail_serializes_camel_case() {
		let mut trail = DebugTrail::default();

		trail.push(DebugEntry {
			request_id: "r1".into(),
			request: DebugRequest {
				url: "u".into(),
				method: "POST".into(),
				headers: Vec::new(),
				body: String::new(),
			},
			response: DebugResponse { status: Some(200), ..Default::default() },
		});

		let json = serde_json::to_value(&trail).expect("Trail should serialize.");

		assert_eq!(json["entries"][0]["requestId"], "r1");
		assert_eq!(json["entries"][0]["response"]["status"], 200);
		assert_eq!(trail.len(), 1);
	}
}
