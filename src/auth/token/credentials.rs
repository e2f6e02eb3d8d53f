//! OAuth2 credentials as returned by token endpoints, plus lifecycle helpers.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Lifecycle status for stored credentials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Credentials are usable.
	Active,
	/// `created_at + expires_in` lies in the past.
	Expired,
}

/// Reasons a token endpoint payload cannot become stored credentials.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CredentialsRejection {
	/// Provider answered with an OAuth error object.
	#[error("{}", provider_message(.error, .description))]
	Provider {
		/// `error` code from the payload.
		error: String,
		/// Optional `error_description`.
		description: Option<String>,
	},
	/// Payload did not carry an `access_token`.
	#[error("Token response did not contain an access_token.")]
	MissingAccessToken,
	/// Payload was neither JSON nor form encoded.
	#[error("Token response could not be parsed.")]
	Unparseable,
}

/// Credentials issued by a token endpoint or an implicit-flow callback.
///
/// Credentials are replaced wholesale, never patched field by field. Fields the provider
/// returns beyond the common set (`id_token`, vendor extras) live in [`Self::extra`].
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuth2Credentials {
	/// Access token secret.
	pub access_token: TokenSecret,
	/// Token type reported by the provider (`Bearer` in practice).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
	/// Refresh token, when issued.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Lifetime in seconds relative to [`Self::created_at`].
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<u64>,
	/// Granted scope string.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	/// Instant the credentials were persisted.
	pub created_at: OffsetDateTime,
	/// Remaining provider fields.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}
impl OAuth2Credentials {
	/// Creates credentials holding only an access token.
	pub fn new(access_token: impl Into<String>, created_at: OffsetDateTime) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			token_type: None,
			refresh_token: None,
			expires_in: None,
			scope: None,
			created_at,
			extra: JsonMap::new(),
		}
	}

	/// Sets the token type.
	pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Sets the refresh token.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(refresh_token));

		self
	}

	/// Sets the lifetime in seconds.
	pub fn with_expires_in(mut self, expires_in: u64) -> Self {
		self.expires_in = Some(expires_in);

		self
	}

	/// Sets the granted scope.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Builds credentials from a decoded token endpoint payload.
	///
	/// Payloads carrying an `error` member or lacking `access_token` are rejected so they
	/// can never reach a store.
	pub fn from_payload(
		payload: &JsonMap<String, JsonValue>,
		created_at: OffsetDateTime,
	) -> Result<Self, CredentialsRejection> {
		if let Some(error) = payload.get("error").filter(|v| !v.is_null()) {
			return Err(CredentialsRejection::Provider {
				error: json_text(error),
				description: payload.get("error_description").map(json_text),
			});
		}

		let access_token = TokenSecret::from_member(payload, "access_token")
			.ok_or(CredentialsRejection::MissingAccessToken)?;
		let mut extra = payload.clone();

		for known in ["access_token", "token_type", "refresh_token", "expires_in", "scope", "created_at"]
		{
			extra.remove(known);
		}

		Ok(Self {
			access_token,
			token_type: payload.get("token_type").and_then(JsonValue::as_str).map(str::to_owned),
			refresh_token: TokenSecret::from_member(payload, "refresh_token"),
			expires_in: payload.get("expires_in").and_then(parse_expires_in),
			scope: payload.get("scope").and_then(JsonValue::as_str).map(str::to_owned),
			created_at,
			extra,
		})
	}

	/// Decodes a raw token endpoint body (JSON first, then form encoding).
	pub fn parse_body(body: &[u8]) -> Result<JsonMap<String, JsonValue>, CredentialsRejection> {
		if let Ok(JsonValue::Object(map)) = serde_json::from_slice::<JsonValue>(body) {
			return Ok(map);
		}

		let text = std::str::from_utf8(body).map_err(|_| CredentialsRejection::Unparseable)?;

		if !text.contains('=') {
			return Err(CredentialsRejection::Unparseable);
		}

		Ok(url::form_urlencoded::parse(text.trim().as_bytes())
			.map(|(k, v)| (k.into_owned(), JsonValue::String(v.into_owned())))
			.collect())
	}

	/// Expiry instant, if the provider reported a lifetime.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		let secs = i64::try_from(self.expires_in?).ok()?;

		self.created_at.checked_add(Duration::seconds(secs))
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		match self.expires_at() {
			Some(expires_at) if expires_at < instant => TokenStatus::Expired,
			_ => TokenStatus::Active,
		}
	}

	/// Returns `true` if the credentials have expired at the provided instant.
	///
	/// Credentials without `expires_in` never expire by time.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Expired)
	}

	/// Returns `true` if the credentials are expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Exposes the credentials as `$oauth2.<credentials_id>.<field>` variables.
	pub fn variables(&self, credentials_id: &str) -> Vec<(String, JsonValue)> {
		let prefix = format!("$oauth2.{credentials_id}");
		let mut vars = vec![(
			format!("{prefix}.access_token"),
			JsonValue::String(self.access_token.expose().to_owned()),
		)];

		if let Some(refresh_token) = &self.refresh_token {
			vars.push((
				format!("{prefix}.refresh_token"),
				JsonValue::String(refresh_token.expose().to_owned()),
			));
		}
		if let Some(token_type) = &self.token_type {
			vars.push((format!("{prefix}.token_type"), JsonValue::String(token_type.clone())));
		}
		if let Some(expires_in) = self.expires_in {
			vars.push((format!("{prefix}.expires_in"), JsonValue::from(expires_in)));
		}

		vars
	}
}
impl Debug for OAuth2Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2Credentials")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_in", &self.expires_in)
			.field("scope", &self.scope)
			.field("created_at", &self.created_at)
			.finish()
	}
}

fn parse_expires_in(value: &JsonValue) -> Option<u64> {
	match value {
		JsonValue::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.).map(|f| f as u64)),
		JsonValue::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

fn provider_message(error: &str, description: &Option<String>) -> String {
	match description {
		Some(description) => format!("{error}: {description}"),
		None => error.to_owned(),
	}
}

fn json_text(value: &JsonValue) -> String {
	match value {
		JsonValue::String(s) => s.clone(),
		other => other.to_string(),
	}
}
