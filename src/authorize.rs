//! Interactive authorization capability used by the code and implicit grants.
//!
//! The crate never opens a browser itself. Callers implement [`Authorizer`] on top of an embedded
//! window or the system browser and resolve once the callback URL is reached.

// self
use crate::_prelude::*;

/// Boxed future returned by [`Authorizer::authorize`].
pub type AuthorizeFuture<'a> =
	Pin<Box<dyn Future<Output = Result<AuthorizeResponse, AuthorizeError>> + 'a + Send>>;

/// Opens an authorization surface and waits for the redirect.
///
/// Implementations impose no timeout; closing the surface must resolve with
/// [`AuthorizeError::Cancelled`].
pub trait Authorizer
where
	Self: Send + Sync,
{
	/// Drives one authorization round trip.
	fn authorize(&self, request: AuthorizeRequest) -> AuthorizeFuture<'_>;
}

/// What the callback is expected to carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
	/// `?code=` in the callback query.
	Code,
	/// Tokens in the callback fragment.
	Token,
}
impl ResponseType {
	/// Wire value of `response_type`.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Code => "code",
			Self::Token => "token",
		}
	}
}

/// Input to [`Authorizer::authorize`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizeRequest {
	/// Fully built authorization URL.
	pub authorize_url: Url,
	/// Redirect target that ends the round trip.
	pub callback_url: String,
	/// Stable identifier for the credential slot, suitable for partitioning browser sessions.
	pub session_id: String,
	/// Expected callback payload.
	pub response_type: ResponseType,
	/// Extra headers for the initial authorization page load.
	pub additional_headers: Vec<(String, String)>,
}

/// Result of a completed authorization round trip.
#[derive(Clone, Debug, PartialEq)]
pub enum AuthorizeResponse {
	/// Authorization code from the callback query.
	Code {
		/// Code to exchange at the token endpoint.
		code: String,
		/// `state` echoed by the provider.
		state: Option<String>,
	},
	/// Token parameters from the callback fragment.
	Implicit(JsonMap<String, JsonValue>),
}

/// Authorization surface failures.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AuthorizeError {
	/// The window or tab was closed before the callback was reached.
	#[error("Authorization window closed before completing.")]
	Cancelled,
	/// The provider redirected back with an error.
	#[error("Authorization denied: {error}.")]
	Denied {
		/// `error` parameter.
		error: String,
		/// `error_description` parameter.
		description: Option<String>,
	},
	/// The callback did not carry the expected parameters.
	#[error("Authorization callback is malformed: {message}.")]
	Callback {
		/// What was missing.
		message: String,
	},
	/// The callback `state` differs from the configured one.
	#[error("Authorization state mismatch.")]
	StateMismatch,
}

/// Extracts the code or implicit tokens from a callback URL.
pub fn parse_callback(
	callback: &Url,
	response_type: ResponseType,
) -> Result<AuthorizeResponse, AuthorizeError> {
	let query = pairs(callback.query());
	let fragment = pairs(callback.fragment());

	for params in [&query, &fragment] {
		if let Some(error) = params.get("error").and_then(JsonValue::as_str) {
			return Err(AuthorizeError::Denied {
				error: error.to_owned(),
				description: params
					.get("error_description")
					.and_then(JsonValue::as_str)
					.map(str::to_owned),
			});
		}
	}

	match response_type {
		ResponseType::Code => {
			let code = query.get("code").and_then(JsonValue::as_str).ok_or_else(|| {
				AuthorizeError::Callback { message: "missing code parameter".into() }
			})?;

			Ok(AuthorizeResponse::Code {
				code: code.to_owned(),
				state: query.get("state").and_then(JsonValue::as_str).map(str::to_owned),
			})
		},
		ResponseType::Token => {
			if !fragment.contains_key("access_token") {
				return Err(AuthorizeError::Callback {
					message: "missing access_token fragment parameter".into(),
				});
			}

			Ok(AuthorizeResponse::Implicit(fragment))
		},
	}
}

fn pairs(raw: Option<&str>) -> JsonMap<String, JsonValue> {
	raw.map(|raw| {
		url::form_urlencoded::parse(raw.as_bytes())
			.map(|(k, v)| (k.into_owned(), JsonValue::String(v.into_owned())))
			.collect()
	})
	.unwrap_or_default()
}
