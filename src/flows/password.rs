//! Resource owner password credentials grant.

// self
use crate::{
	_prelude::*,
	auth::{OAuth2Config, PasswordGrant, present},
	flows::{
		CredentialsRequest, DebugTrail, Exchange, OAuth2Engine, TokenForm, endpoint, required,
	},
	http::TokenHttpClient,
};

const FLOW: &str = "OAuth2 password credentials flow";

/// Builds the token request, or names the first missing field.
pub fn password_form(config: &OAuth2Config, grant: &PasswordGrant) -> Result<TokenForm, String> {
	let token_url = required(&grant.access_token_url, "Access Token URL", FLOW)?;
	let username = required(&grant.username, "Username", FLOW)?;
	let password = required(&grant.password, "Password", FLOW)?;
	let client_id = required(&grant.client_id, "Client ID", FLOW)?;

	Ok(TokenForm::new(endpoint(token_url, "Access Token URL")?, "password")
		.param("username", username)
		.param("password", password)
		.optional_param("scope", present(&grant.scope))
		.client_auth(Some(client_id), present(&grant.client_secret), grant.credentials_placement)
		.additional(&config.additional_parameters.token))
}

impl<C> OAuth2Engine<C>
where
	C: ?Sized + TokenHttpClient,
{
	pub(crate) async fn password(
		&self,
		request: &CredentialsRequest,
		grant: &PasswordGrant,
		debug: &mut DebugTrail,
	) -> Result<Exchange> {
		match password_form(&request.config, grant) {
			Ok(form) => self.exchange(form, &request.transport, debug).await,
			Err(message) => Ok(Exchange::Rejected(message)),
		}
	}
}
