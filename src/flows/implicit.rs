//! Implicit grant: tokens arrive in the callback fragment, with no token endpoint call.
//!
//! Implicit credentials cannot be refreshed. When they expire the flow authorizes again.

// self
use crate::{
	_prelude::*,
	auth::{CredentialsRejection, ImplicitGrant, OAuth2Config, OAuth2Credentials, present},
	authorize::{AuthorizeRequest, AuthorizeResponse, ResponseType},
	flows::{
		CredentialsRequest, Exchange, OAuth2Engine, authorize_request, endpoint, required,
		session_id, verify_state,
	},
	http::TokenHttpClient,
};

const FLOW: &str = "OAuth2 implicit flow";
const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Builds the authorization request, or names the first missing field.
pub fn implicit_request(
	config: &OAuth2Config,
	grant: &ImplicitGrant,
	session_id: String,
) -> Result<AuthorizeRequest, String> {
	let authorization_url = required(&grant.authorization_url, "Authorization URL", FLOW)?;
	let callback_url = required(&grant.callback_url, "Callback URL", FLOW)?;
	let mut url = endpoint(authorization_url, "Authorization URL")?;
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", ResponseType::Token.as_str());

	if let Some(client_id) = present(&grant.client_id) {
		pairs.append_pair("client_id", client_id);
	}

	pairs.append_pair("redirect_uri", callback_url);

	if let Some(scope) = present(&grant.scope) {
		pairs.append_pair("scope", scope);
	}
	if let Some(state) = present(&grant.state) {
		pairs.append_pair("state", state);
	}

	drop(pairs);

	Ok(authorize_request(
		url,
		callback_url,
		session_id,
		ResponseType::Token,
		&config.additional_parameters.authorization,
	))
}

/// Turns callback fragment parameters into credentials.
///
/// `token_type` defaults to `Bearer`; the echoed `state` is checked and dropped.
pub fn implicit_credentials(
	grant: &ImplicitGrant,
	params: &JsonMap<String, JsonValue>,
	created_at: OffsetDateTime,
) -> Result<OAuth2Credentials, String> {
	verify_state(present(&grant.state), params.get("state").and_then(JsonValue::as_str))
		.map_err(|e| e.to_string())?;

	let mut credentials =
		OAuth2Credentials::from_payload(params, created_at).map_err(|rejection| match rejection {
			CredentialsRejection::MissingAccessToken =>
				"No access token received from authorization server".to_owned(),
			other => other.to_string(),
		})?;

	credentials.extra.remove("state");

	if credentials.token_type.is_none() {
		credentials.token_type = Some(DEFAULT_TOKEN_TYPE.into());
	}

	Ok(credentials)
}

impl<C> OAuth2Engine<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Authorizes interactively; every failure becomes a rejection.
	pub(crate) async fn implicit(
		&self,
		request: &CredentialsRequest,
		grant: &ImplicitGrant,
	) -> Result<Exchange> {
		let config = &request.config;
		let authorize = match implicit_request(
			config,
			grant,
			session_id(request.collection_uid.as_ref(), config.store_url()),
		) {
			Ok(authorize) => authorize,
			Err(message) => return Ok(Exchange::Rejected(message)),
		};
		let exchange = match self.authorizer.authorize(authorize).await {
			Ok(AuthorizeResponse::Implicit(params)) =>
				match implicit_credentials(grant, &params, OffsetDateTime::now_utc()) {
					Ok(credentials) => Exchange::Issued(credentials),
					Err(message) => Exchange::Rejected(message),
				},
			Ok(AuthorizeResponse::Code { .. }) =>
				Exchange::Rejected("Authorization callback did not carry implicit tokens".into()),
			Err(e) => Exchange::Rejected(e.to_string()),
		};

		Ok(exchange)
	}
}
