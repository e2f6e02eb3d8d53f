//! Authorization modes attached to collections, folders, and requests.

// self
use crate::{_prelude::*, auth::grant::OAuth2Config};

/// Authorization configuration, one variant per mode.
///
/// Serialized with a `mode` tag so collection JSON reads `{"mode":"bearer","token":"..."}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum AuthConfig {
	/// No authorization.
	#[default]
	None,
	/// Defer to the nearest ancestor that configures auth.
	Inherit,
	/// HTTP Basic.
	Basic(BasicAuth),
	/// Static bearer token.
	Bearer(BearerAuth),
	/// HTTP Digest; challenge handling belongs to the transport.
	Digest(DigestAuth),
	/// API key in a header or query parameter.
	ApiKey(ApiKeyAuth),
	/// AWS Signature Version 4; signing belongs to the transport.
	AwsV4(AwsV4Auth),
	/// WS-Security UsernameToken; digest computation belongs to the transport.
	Wsse(WsseAuth),
	/// OAuth 2.0 with managed credentials.
	OAuth2(OAuth2Config),
}
impl AuthConfig {
	/// Returns the fieldless mode tag.
	pub fn mode(&self) -> AuthMode {
		match self {
			Self::None => AuthMode::None,
			Self::Inherit => AuthMode::Inherit,
			Self::Basic(_) => AuthMode::Basic,
			Self::Bearer(_) => AuthMode::Bearer,
			Self::Digest(_) => AuthMode::Digest,
			Self::ApiKey(_) => AuthMode::ApiKey,
			Self::AwsV4(_) => AuthMode::AwsV4,
			Self::Wsse(_) => AuthMode::Wsse,
			Self::OAuth2(_) => AuthMode::OAuth2,
		}
	}

	/// Returns the OAuth2 block when the mode is `oauth2`.
	pub fn as_oauth2(&self) -> Option<&OAuth2Config> {
		match self {
			Self::OAuth2(config) => Some(config),
			_ => None,
		}
	}
}

/// Mode tag of an [`AuthConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthMode {
	/// `none`.
	None,
	/// `inherit`.
	Inherit,
	/// `basic`.
	Basic,
	/// `bearer`.
	Bearer,
	/// `digest`.
	Digest,
	/// `apikey`.
	ApiKey,
	/// `awsv4`.
	AwsV4,
	/// `wsse`.
	Wsse,
	/// `oauth2`.
	OAuth2,
}
impl AuthMode {
	/// Returns the wire label of the mode.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthMode::None => "none",
			AuthMode::Inherit => "inherit",
			AuthMode::Basic => "basic",
			AuthMode::Bearer => "bearer",
			AuthMode::Digest => "digest",
			AuthMode::ApiKey => "apikey",
			AuthMode::AwsV4 => "awsv4",
			AuthMode::Wsse => "wsse",
			AuthMode::OAuth2 => "oauth2",
		}
	}
}
impl Display for AuthMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// HTTP Basic credentials.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicAuth {
	/// User name.
	pub username: String,
	/// Password.
	pub password: String,
}

/// Static bearer token.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BearerAuth {
	/// Token value.
	pub token: String,
}

/// HTTP Digest credentials.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestAuth {
	/// User name.
	pub username: String,
	/// Password.
	pub password: String,
}

/// WS-Security UsernameToken credentials.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WsseAuth {
	/// User name.
	pub username: String,
	/// Password.
	pub password: String,
}

/// Where an API key travels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyPlacement {
	/// Request header.
	#[default]
	Header,
	/// Query parameter.
	#[serde(alias = "query")]
	QueryParams,
}

/// API key credentials.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeyAuth {
	/// Header or parameter name.
	pub key: String,
	/// Key value.
	pub value: String,
	/// Placement.
	pub placement: ApiKeyPlacement,
}

/// AWS Signature Version 4 inputs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AwsV4Auth {
	/// Access key id.
	pub access_key_id: String,
	/// Secret access key.
	pub secret_access_key: String,
	/// Optional session token.
	pub session_token: String,
	/// Service name.
	pub service: String,
	/// Region.
	pub region: String,
	/// Named profile.
	pub profile_name: String,
}
