//! Authorization code grant, optionally hardened with PKCE.
//!
//! A verifier is generated for every attempt; it is only sent when the block enables PKCE.

// self
use crate::{
	_prelude::*,
	auth::{AuthorizationCodeGrant, OAuth2Config, present},
	authorize::{AuthorizeError, AuthorizeRequest, AuthorizeResponse, ResponseType},
	flows::{
		CredentialsRequest, DebugTrail, Exchange, OAuth2Engine, TokenForm, authorize_request,
		endpoint, pkce::PkcePair, required, session_id, verify_state,
	},
	http::TokenHttpClient,
};

const FLOW: &str = "OAuth2 authorization code flow";

/// Builds the authorization request, or names the first missing field.
pub fn authorization_code_request(
	config: &OAuth2Config,
	grant: &AuthorizationCodeGrant,
	pkce: &PkcePair,
	session_id: String,
) -> Result<AuthorizeRequest, String> {
	let authorization_url = required(&grant.authorization_url, "Authorization URL", FLOW)?;

	required(&grant.access_token_url, "Access Token URL", FLOW)?;

	let callback_url = required(&grant.callback_url, "Callback URL", FLOW)?;
	let client_id = required(&grant.client_id, "Client ID", FLOW)?;
	let mut url = endpoint(authorization_url, "Authorization URL")?;
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", ResponseType::Code.as_str());
	pairs.append_pair("client_id", client_id);
	pairs.append_pair("redirect_uri", callback_url);

	if let Some(scope) = present(&grant.scope) {
		pairs.append_pair("scope", scope);
	}
	if let Some(state) = present(&grant.state) {
		pairs.append_pair("state", state);
	}
	if grant.pkce {
		pairs.append_pair("code_challenge", &pkce.challenge);
		pairs.append_pair("code_challenge_method", pkce.method.as_str());
	}

	drop(pairs);

	Ok(authorize_request(
		url,
		callback_url,
		session_id,
		ResponseType::Code,
		&config.additional_parameters.authorization,
	))
}

/// Builds the code exchange request.
pub fn authorization_code_form(
	config: &OAuth2Config,
	grant: &AuthorizationCodeGrant,
	code: &str,
	pkce: &PkcePair,
) -> Result<TokenForm, String> {
	let token_url = required(&grant.access_token_url, "Access Token URL", FLOW)?;
	let callback_url = required(&grant.callback_url, "Callback URL", FLOW)?;
	let mut form = TokenForm::new(endpoint(token_url, "Access Token URL")?, "authorization_code")
		.param("code", code)
		.param("redirect_uri", callback_url)
		.client_auth(
			present(&grant.client_id),
			present(&grant.client_secret),
			grant.credentials_placement,
		);

	if grant.pkce {
		form = form.param("code_verifier", pkce.verifier.clone());
	}

	Ok(form.additional(&config.additional_parameters.token))
}

impl<C> OAuth2Engine<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Authorizes interactively, then exchanges the code.
	///
	/// A rejected or abandoned authorization fails with [`Error::Authorization`].
	pub(crate) async fn authorization_code(
		&self,
		request: &CredentialsRequest,
		grant: &AuthorizationCodeGrant,
		debug: &mut DebugTrail,
	) -> Result<Exchange> {
		let config = &request.config;
		let pkce = PkcePair::generate();
		let authorize = match authorization_code_request(
			config,
			grant,
			&pkce,
			session_id(request.collection_uid.as_ref(), config.store_url()),
		) {
			Ok(authorize) => authorize,
			Err(message) => return Ok(Exchange::Rejected(message)),
		};
		let code = match self.authorizer.authorize(authorize).await? {
			AuthorizeResponse::Code { code, state } => {
				verify_state(present(&grant.state), state.as_deref())?;

				code
			},
			AuthorizeResponse::Implicit(_) =>
				return Err(AuthorizeError::Callback {
					message: "expected an authorization code".into(),
				}
				.into()),
		};

		match authorization_code_form(config, grant, &code, &pkce) {
			Ok(form) => self.exchange(form, &request.transport, debug).await,
			Err(message) => Ok(Exchange::Rejected(message)),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::{AdditionalParameter, OAuth2Grant, ParameterTarget},
		flows::pkce::compute_pkce_challenge,
	};

	fn grant(pkce: bool) -> AuthorizationCodeGrant {
		AuthorizationCodeGrant {
			authorization_url: Some("https://idp.test/authorize".into()),
			access_token_url: Some("https://idp.test/token".into()),
			callback_url: Some("https://app.test/cb".into()),
			client_id: Some("cli".into()),
			client_secret: Some("sec".into()),
			scope: Some("openid profile".into()),
			state: Some("xyz".into()),
			pkce,
			..Default::default()
		}
	}

	fn config(grant: &AuthorizationCodeGrant) -> OAuth2Config {
		OAuth2Config::new(OAuth2Grant::AuthorizationCode(grant.clone()))
	}

	fn query(url: &Url, name: &str) -> Option<String> {
		url.query_pairs().find(|(key, _)| key == name).map(|(_, value)| value.into_owned())
	}

	#[test]
	fn authorize_url_carries_pkce_challenge() {
		let grant = grant(true);
		let pkce = PkcePair::generate();
		let request = authorization_code_request(&config(&grant), &grant, &pkce, "sid".into())
			.expect("Complete grant should build an authorization request.");
		let url = &request.authorize_url;

		assert_eq!(query(url, "response_type").as_deref(), Some("code"));
		assert_eq!(query(url, "redirect_uri").as_deref(), Some("https://app.test/cb"));
		assert_eq!(query(url, "scope").as_deref(), Some("openid profile"));
		assert_eq!(query(url, "state").as_deref(), Some("xyz"));
		assert_eq!(query(url, "code_challenge"), Some(compute_pkce_challenge(&pkce.verifier)));
		assert_eq!(query(url, "code_challenge_method").as_deref(), Some("S256"));
		assert_eq!(request.response_type, ResponseType::Code);
	}

	#[test]
	fn pkce_disabled_sends_neither_challenge_nor_verifier() {
		let grant = grant(false);
		let pkce = PkcePair::generate();
		let config = config(&grant);
		let request = authorization_code_request(&config, &grant, &pkce, "sid".into())
			.expect("Complete grant should build an authorization request.");

		assert_eq!(query(&request.authorize_url, "code_challenge"), None);

		let debug = authorization_code_form(&config, &grant, "c0de", &pkce)
			.expect("Complete grant should build a form.")
			.to_debug_request();

		assert_eq!(debug.form_value("code").as_deref(), Some("c0de"));
		assert_eq!(debug.form_value("code_verifier"), None);
	}

	#[test]
	fn exchange_form_carries_verifier_and_token_parameters() {
		let grant = grant(true);
		let pkce = PkcePair::generate();
		let config = config(&grant).with_additional_parameters(crate::auth::AdditionalParameters {
			token: vec![AdditionalParameter::new("audience", "api", ParameterTarget::Body)],
			..Default::default()
		});
		let debug = authorization_code_form(&config, &grant, "c0de", &pkce)
			.expect("Complete grant should build a form.")
			.to_debug_request();

		assert_eq!(debug.form_value("grant_type").as_deref(), Some("authorization_code"));
		assert_eq!(debug.form_value("code_verifier"), Some(pkce.verifier.clone()));
		assert_eq!(debug.form_value("audience").as_deref(), Some("api"));
	}

	#[test]
	fn callback_url_is_required() {
		let grant = AuthorizationCodeGrant { callback_url: None, ..grant(false) };

		assert_eq!(
			authorization_code_request(&config(&grant), &grant, &PkcePair::generate(), "s".into())
				.expect_err("Missing callback should be reported."),
			"Callback URL is required for OAuth2 authorization code flow"
		);
	}
}
