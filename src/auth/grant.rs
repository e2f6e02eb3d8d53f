//! OAuth2 auth blocks: grant-specific fields, token placement, and extra parameters.

// self
use crate::_prelude::*;

/// Default credentials identifier used when a config omits one.
pub const DEFAULT_CREDENTIALS_ID: &str = "credentials";
/// Default prefix for the `Authorization` header.
pub const DEFAULT_TOKEN_HEADER_PREFIX: &str = "Bearer";
/// Default query parameter used when tokens travel in the URL.
pub const DEFAULT_TOKEN_QUERY_KEY: &str = "access_token";

/// OAuth2 auth block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2Config {
	/// Grant type and its fields.
	#[serde(flatten)]
	pub grant: OAuth2Grant,
	/// Caller-chosen identifier separating several credentials for one token URL.
	#[serde(default = "default_credentials_id")]
	pub credentials_id: String,
	/// Where the access token is injected into outgoing requests.
	#[serde(default)]
	pub token_placement: TokenPlacement,
	/// Prefix used with [`TokenPlacement::Header`].
	#[serde(default = "default_token_header_prefix")]
	pub token_header_prefix: String,
	/// Query key used with [`TokenPlacement::Url`].
	#[serde(default = "default_token_query_key")]
	pub token_query_key: String,
	/// Acquire new credentials when none are usable.
	#[serde(default = "default_true")]
	pub auto_fetch_token: bool,
	/// Refresh expired credentials when a refresh token exists.
	#[serde(default)]
	pub auto_refresh_token: bool,
	/// Extra parameters per endpoint.
	#[serde(default)]
	pub additional_parameters: AdditionalParameters,
}
impl OAuth2Config {
	/// Creates a config around `grant` with every setting at its default.
	pub fn new(grant: OAuth2Grant) -> Self {
		Self {
			grant,
			credentials_id: default_credentials_id(),
			token_placement: TokenPlacement::default(),
			token_header_prefix: default_token_header_prefix(),
			token_query_key: default_token_query_key(),
			auto_fetch_token: true,
			auto_refresh_token: false,
			additional_parameters: AdditionalParameters::default(),
		}
	}

	/// Overrides the credentials identifier.
	pub fn with_credentials_id(mut self, credentials_id: impl Into<String>) -> Self {
		self.credentials_id = credentials_id.into();

		self
	}

	/// Overrides the auto-fetch and auto-refresh switches.
	pub fn with_policy(mut self, auto_fetch_token: bool, auto_refresh_token: bool) -> Self {
		self.auto_fetch_token = auto_fetch_token;
		self.auto_refresh_token = auto_refresh_token;

		self
	}

	/// Replaces the additional parameter lists.
	pub fn with_additional_parameters(mut self, params: AdditionalParameters) -> Self {
		self.additional_parameters = params;

		self
	}

	/// URL keying the token store slot.
	///
	/// Implicit grants have no token endpoint, so their slot is keyed by the authorization URL.
	pub fn store_url(&self) -> &str {
		match &self.grant {
			OAuth2Grant::Implicit(grant) => field(&grant.authorization_url),
			OAuth2Grant::AuthorizationCode(grant) => field(&grant.access_token_url),
			OAuth2Grant::ClientCredentials(grant) => field(&grant.access_token_url),
			OAuth2Grant::Password(grant) => field(&grant.access_token_url),
		}
	}

	/// Refresh endpoint, falling back to the access token URL.
	pub fn refresh_url(&self) -> Option<&str> {
		let (refresh, access) = match &self.grant {
			OAuth2Grant::AuthorizationCode(grant) =>
				(&grant.refresh_token_url, &grant.access_token_url),
			OAuth2Grant::ClientCredentials(grant) =>
				(&grant.refresh_token_url, &grant.access_token_url),
			OAuth2Grant::Password(grant) => (&grant.refresh_token_url, &grant.access_token_url),
			OAuth2Grant::Implicit(_) => return None,
		};

		present(refresh).or_else(|| present(access))
	}

	/// Client id and secret shared by every grant that authenticates the client.
	pub fn client(&self) -> (Option<&str>, Option<&str>, CredentialsPlacement) {
		match &self.grant {
			OAuth2Grant::AuthorizationCode(grant) => (
				present(&grant.client_id),
				present(&grant.client_secret),
				grant.credentials_placement,
			),
			OAuth2Grant::ClientCredentials(grant) => (
				present(&grant.client_id),
				present(&grant.client_secret),
				grant.credentials_placement,
			),
			OAuth2Grant::Password(grant) => (
				present(&grant.client_id),
				present(&grant.client_secret),
				grant.credentials_placement,
			),
			OAuth2Grant::Implicit(grant) =>
				(present(&grant.client_id), None, CredentialsPlacement::Body),
		}
	}
}

/// Grant type with only the fields that grant uses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "grantType", rename_all = "snake_case")]
pub enum OAuth2Grant {
	/// Authorization code, optionally hardened with PKCE.
	AuthorizationCode(AuthorizationCodeGrant),
	/// Client credentials.
	ClientCredentials(ClientCredentialsGrant),
	/// Resource owner password credentials.
	Password(PasswordGrant),
	/// Implicit grant; tokens arrive in the callback fragment.
	Implicit(ImplicitGrant),
}
impl OAuth2Grant {
	/// Returns the wire label of the grant.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::AuthorizationCode(_) => "authorization_code",
			Self::ClientCredentials(_) => "client_credentials",
			Self::Password(_) => "password",
			Self::Implicit(_) => "implicit",
		}
	}
}

/// Authorization code grant fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthorizationCodeGrant {
	/// Authorization endpoint.
	pub authorization_url: Option<String>,
	/// Token endpoint.
	pub access_token_url: Option<String>,
	/// Refresh endpoint, when it differs from the token endpoint.
	pub refresh_token_url: Option<String>,
	/// Redirect URI registered with the provider.
	pub callback_url: Option<String>,
	/// Client identifier.
	pub client_id: Option<String>,
	/// Client secret.
	pub client_secret: Option<String>,
	/// Requested scope.
	pub scope: Option<String>,
	/// Opaque state round-tripped through the authorization redirect.
	pub state: Option<String>,
	/// Send a PKCE challenge and verifier.
	pub pkce: bool,
	/// Client credential placement on token requests.
	pub credentials_placement: CredentialsPlacement,
}

/// Client credentials grant fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientCredentialsGrant {
	/// Token endpoint.
	pub access_token_url: Option<String>,
	/// Refresh endpoint, when it differs from the token endpoint.
	pub refresh_token_url: Option<String>,
	/// Client identifier.
	pub client_id: Option<String>,
	/// Client secret.
	pub client_secret: Option<String>,
	/// Requested scope.
	pub scope: Option<String>,
	/// Client credential placement on token requests.
	pub credentials_placement: CredentialsPlacement,
}

/// Password grant fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PasswordGrant {
	/// Token endpoint.
	pub access_token_url: Option<String>,
	/// Refresh endpoint, when it differs from the token endpoint.
	pub refresh_token_url: Option<String>,
	/// Resource owner name.
	pub username: Option<String>,
	/// Resource owner password.
	pub password: Option<String>,
	/// Client identifier.
	pub client_id: Option<String>,
	/// Client secret.
	pub client_secret: Option<String>,
	/// Requested scope.
	pub scope: Option<String>,
	/// Client credential placement on token requests.
	pub credentials_placement: CredentialsPlacement,
}

/// Implicit grant fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImplicitGrant {
	/// Authorization endpoint.
	pub authorization_url: Option<String>,
	/// Redirect URI registered with the provider.
	pub callback_url: Option<String>,
	/// Client identifier.
	pub client_id: Option<String>,
	/// Requested scope.
	pub scope: Option<String>,
	/// Opaque state round-tripped through the authorization redirect.
	pub state: Option<String>,
}

/// Client credential placement on token requests. The two placements never overlap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialsPlacement {
	/// `client_id` and `client_secret` in the form body.
	#[default]
	Body,
	/// `Authorization: Basic base64(id:secret)`; neither value is sent in the body.
	BasicAuthHeader,
}

/// Where issued access tokens are injected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPlacement {
	/// `Authorization` header.
	#[default]
	Header,
	/// Query parameter.
	Url,
}

/// Extra name/value pairs per OAuth2 endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditionalParameters {
	/// Parameters for the authorization request.
	pub authorization: Vec<AdditionalParameter>,
	/// Parameters for token requests.
	pub token: Vec<AdditionalParameter>,
	/// Parameters for refresh requests.
	pub refresh: Vec<AdditionalParameter>,
}

/// One extra parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalParameter {
	/// Parameter name; entries without one are skipped.
	#[serde(default)]
	pub name: String,
	/// Parameter value.
	#[serde(default)]
	pub value: String,
	/// Target part of the request.
	#[serde(default)]
	pub send_in: ParameterTarget,
	/// Disabled entries are skipped.
	#[serde(default = "default_true")]
	pub enabled: bool,
}
impl AdditionalParameter {
	/// Creates an enabled parameter.
	pub fn new(name: impl Into<String>, value: impl Into<String>, send_in: ParameterTarget) -> Self {
		Self { name: name.into(), value: value.into(), send_in, enabled: true }
	}

	/// Returns `true` if the entry should be sent.
	pub fn is_active(&self) -> bool {
		self.enabled && !self.name.is_empty()
	}
}

/// Request part an [`AdditionalParameter`] is written to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterTarget {
	/// Request header.
	Headers,
	/// URL query string.
	#[serde(alias = "query")]
	QueryParams,
	/// Form body.
	#[default]
	Body,
}

/// Returns the value when it is present and not blank.
pub fn present(value: &Option<String>) -> Option<&str> {
	value.as_deref().filter(|v| !v.trim().is_empty())
}

fn field(value: &Option<String>) -> &str {
	value.as_deref().unwrap_or_default()
}

fn default_credentials_id() -> String {
	DEFAULT_CREDENTIALS_ID.into()
}

fn default_token_header_prefix() -> String {
	DEFAULT_TOKEN_HEADER_PREFIX.into()
}

fn default_token_query_key() -> String {
	DEFAULT_TOKEN_QUERY_KEY.into()
}

fn default_true() -> bool {
	true
}
