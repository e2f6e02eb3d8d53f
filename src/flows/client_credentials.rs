//! Client credentials grant: one token endpoint call authenticated by the client itself.

// self
use crate::{
	_prelude::*,
	auth::{ClientCredentialsGrant, OAuth2Config, present},
	flows::{
		CredentialsRequest, DebugTrail, Exchange, OAuth2Engine, TokenForm, endpoint, required,
	},
	http::TokenHttpClient,
};

const FLOW: &str = "OAuth2 client credentials flow";

/// Builds the token request, or names the first missing field.
pub fn client_credentials_form(
	config: &OAuth2Config,
	grant: &ClientCredentialsGrant,
) -> Result<TokenForm, String> {
	let token_url = required(&grant.access_token_url, "Access Token URL", FLOW)?;
	let client_id = required(&grant.client_id, "Client ID", FLOW)?;
	let client_secret = required(&grant.client_secret, "Client Secret", FLOW)?;

	Ok(TokenForm::new(endpoint(token_url, "Access Token URL")?, "client_credentials")
		.optional_param("scope", present(&grant.scope))
		.client_auth(Some(client_id), Some(client_secret), grant.credentials_placement)
		.additional(&config.additional_parameters.token))
}

impl<C> OAuth2Engine<C>
where
	C: ?Sized + TokenHttpClient,
{
	pub(crate) async fn client_credentials(
		&self,
		request: &CredentialsRequest,
		grant: &ClientCredentialsGrant,
		debug: &mut DebugTrail,
	) -> Result<Exchange> {
		match client_credentials_form(&request.config, grant) {
			Ok(form) => self.exchange(form, &request.transport, debug).await,
			Err(message) => Ok(Exchange::Rejected(message)),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::{CredentialsPlacement, OAuth2Grant};

	fn grant() -> ClientCredentialsGrant {
		ClientCredentialsGrant {
			access_token_url: Some("https://idp.test/token".into()),
			client_id: Some("cli".into()),
			client_secret: Some("sec".into()),
			scope: Some("read".into()),
			..Default::default()
		}
	}

	fn config(grant: &ClientCredentialsGrant) -> OAuth2Config {
		OAuth2Config::new(OAuth2Grant::ClientCredentials(grant.clone()))
	}

	#[test]
	fn form_carries_grant_scope_and_client() {
		let grant = grant();
		let debug = client_credentials_form(&config(&grant), &grant)
			.expect("Complete grant should build a form.")
			.to_debug_request();

		assert_eq!(debug.form_value("grant_type").as_deref(), Some("client_credentials"));
		assert_eq!(debug.form_value("scope").as_deref(), Some("read"));
		assert_eq!(debug.form_value("client_secret").as_deref(), Some("sec"));
	}

	#[test]
	fn blank_scope_is_omitted_and_basic_placement_is_exclusive() {
		let grant = ClientCredentialsGrant {
			scope: Some(" ".into()),
			credentials_placement: CredentialsPlacement::BasicAuthHeader,
			..grant()
		};
		let debug = client_credentials_form(&config(&grant), &grant)
			.expect("Complete grant should build a form.")
			.to_debug_request();

		assert_eq!(debug.form_value("scope"), None);
		assert_eq!(debug.form_value("client_id"), None);
		assert!(debug.header("authorization").is_some_and(|value| value.starts_with("Basic ")));
	}

	#[test]
	fn missing_fields_are_reported_in_order() {
		let grant = ClientCredentialsGrant { access_token_url: None, client_secret: None, ..grant() };
		let err = client_credentials_form(&config(&grant), &grant)
			.expect_err("Missing token URL should be reported.");

		assert_eq!(err, "Access Token URL is required for OAuth2 client credentials flow");

		let grant = ClientCredentialsGrant { client_secret: None, ..self::grant() };
		let err = client_credentials_form(&config(&grant), &grant)
			.expect_err("Missing secret should be reported.");

		assert_eq!(err, "Client Secret is required for OAuth2 client credentials flow");
	}
}
