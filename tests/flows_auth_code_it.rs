#![cfg(all(feature = "test", feature = "reqwest"))]

// crates.io
use httpmock::prelude::*;
// self
use request_preflight::{
	_preludet::*,
	auth::{AuthorizationCodeGrant, CollectionUid, ImplicitGrant, OAuth2Config, OAuth2Grant},
	authorize::{AuthorizeError, AuthorizeResponse, ResponseType, parse_callback},
	flows::{CredentialsRequest, CredentialsSource, pkce::compute_pkce_challenge, session_id},
	store::TokenStore,
};

const CALLBACK: &str = "https://app.test/callback";

fn collection_uid() -> CollectionUid {
	CollectionUid::new("collection-auth-code").expect("Collection identifier should be valid.")
}

fn code_config(server: &MockServer, pkce: bool) -> OAuth2Config {
	OAuth2Config::new(OAuth2Grant::AuthorizationCode(AuthorizationCodeGrant {
		authorization_url: Some(server.url("/authorize")),
		access_token_url: Some(server.url("/token")),
		callback_url: Some(CALLBACK.into()),
		client_id: Some("code-client".into()),
		client_secret: Some("code-secret".into()),
		scope: Some("openid email".into()),
		state: Some("xyz".into()),
		pkce,
		..Default::default()
	}))
}

fn callback(raw: &str, response_type: ResponseType) -> Result<AuthorizeResponse, AuthorizeError> {
	parse_callback(&Url::parse(raw).expect("Callback fixture should parse."), response_type)
}

#[tokio::test]
async fn authorization_code_with_pkce_exchanges_verifier() {
	let server = MockServer::start_async().await;
	let authorizer = Arc::new(ScriptedAuthorizer::default());
	let (engine, store) = build_reqwest_test_engine(authorizer.clone());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"code-token\",\"refresh_token\":\"code-refresh\",\"expires_in\":600}",
			);
		})
		.await;

	authorizer.push(callback(&format!("{CALLBACK}?code=abc&state=xyz"), ResponseType::Code));

	let request = CredentialsRequest::new(collection_uid(), code_config(&server, true));
	let outcome = engine.credentials(request.clone()).await.expect("Code flow should succeed.");

	mock.assert_async().await;

	let seen = authorizer.requests();
	let authorize = &seen[0];
	let query: HashMap<_, _> = authorize.authorize_url.query_pairs().into_owned().collect();
	let sent = &outcome.debug.last().expect("The exchange should be recorded.").request;
	let verifier = sent.form_value("code_verifier").expect("PKCE verifier should be sent.");

	assert_eq!(seen.len(), 1);
	assert_eq!(authorize.response_type, ResponseType::Code);
	assert_eq!(authorize.callback_url, CALLBACK);
	assert_eq!(authorize.session_id, session_id("collection-auth-code", &server.url("/token")));
	assert_eq!(query.get("response_type").map(String::as_str), Some("code"));
	assert_eq!(query.get("client_id").map(String::as_str), Some("code-client"));
	assert_eq!(query.get("redirect_uri").map(String::as_str), Some(CALLBACK));
	assert_eq!(query.get("state").map(String::as_str), Some("xyz"));
	assert_eq!(query.get("code_challenge_method").map(String::as_str), Some("S256"));
	assert_eq!(
		query.get("code_challenge").map(String::as_str),
		Some(compute_pkce_challenge(&verifier).as_str())
	);
	assert_eq!(sent.form_value("grant_type").as_deref(), Some("authorization_code"));
	assert_eq!(sent.form_value("code").as_deref(), Some("abc"));
	assert_eq!(sent.form_value("redirect_uri").as_deref(), Some(CALLBACK));
	assert_eq!(outcome.source, CredentialsSource::Fetched);
	assert_eq!(outcome.access_token(), Some("code-token"));
	assert!(
		store
			.get(&request.key())
			.await
			.expect("Token store fetch should succeed.")
			.is_some()
	);
}

#[tokio::test]
async fn authorization_code_without_pkce_omits_challenge() {
	let server = MockServer::start_async().await;
	let authorizer = Arc::new(ScriptedAuthorizer::default());
	let (engine, _) = build_reqwest_test_engine(authorizer.clone());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body("{\"access_token\":\"plain\"}");
		})
		.await;

	authorizer.push(callback(&format!("{CALLBACK}?code=abc"), ResponseType::Code));

	let outcome = engine
		.credentials(CredentialsRequest::new(collection_uid(), code_config(&server, false)))
		.await
		.expect("Code flow should succeed.");
	let authorize_url = &authorizer.requests()[0].authorize_url;
	let sent = &outcome.debug.last().expect("The exchange should be recorded.").request;

	mock.assert_async().await;

	assert!(!authorize_url.query_pairs().any(|(name, _)| name == "code_challenge"));
	assert_eq!(sent.form_value("code_verifier"), None);
	assert_eq!(outcome.access_token(), Some("plain"));
}

#[tokio::test]
async fn state_mismatch_fails_before_exchange() {
	let server = MockServer::start_async().await;
	let authorizer = Arc::new(ScriptedAuthorizer::default());
	let (engine, store) = build_reqwest_test_engine(authorizer.clone());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).body("{\"access_token\":\"never\"}");
		})
		.await;

	authorizer.push(callback(&format!("{CALLBACK}?code=abc&state=forged"), ResponseType::Code));

	let err = engine
		.credentials(CredentialsRequest::new(collection_uid(), code_config(&server, true)))
		.await
		.expect_err("Mismatched state must fail.");

	mock.assert_calls_async(0).await;

	assert!(matches!(err, Error::Authorization(AuthorizeError::StateMismatch)));
	assert!(store.is_empty());
}

#[tokio::test]
async fn closed_authorization_window_is_an_error() {
	let server = MockServer::start_async().await;
	let (engine, _) = build_reqwest_test_engine(Arc::new(ScriptedAuthorizer::default()));
	let err = engine
		.credentials(CredentialsRequest::new(collection_uid(), code_config(&server, false)))
		.await
		.expect_err("A cancelled authorization must fail.");

	assert!(matches!(err, Error::Authorization(AuthorizeError::Cancelled)));
}

#[tokio::test]
async fn implicit_tokens_come_from_callback_fragment() {
	let authorizer = Arc::new(ScriptedAuthorizer::default());
	let (engine, store) = build_reqwest_test_engine(authorizer.clone());
	let config = OAuth2Config::new(OAuth2Grant::Implicit(ImplicitGrant {
		authorization_url: Some("https://idp.test/authorize".into()),
		callback_url: Some(CALLBACK.into()),
		client_id: Some("implicit-client".into()),
		state: Some("s1".into()),
		..Default::default()
	}));

	authorizer.push(callback(
		&format!("{CALLBACK}#access_token=frag-token&expires_in=300&state=s1"),
		ResponseType::Token,
	));

	let request = CredentialsRequest::new(collection_uid(), config);
	let outcome = engine.credentials(request.clone()).await.expect("Implicit flow should succeed.");
	let credentials = outcome.credentials.as_ref().expect("Implicit credentials should be issued.");

	assert_eq!(authorizer.requests()[0].response_type, ResponseType::Token);
	assert_eq!(credentials.access_token.expose(), "frag-token");
	assert_eq!(credentials.token_type.as_deref(), Some("Bearer"));
	assert_eq!(credentials.expires_in, Some(300));
	assert!(!credentials.extra.contains_key("state"));
	assert!(outcome.debug.is_empty());
	assert_eq!(request.key().url, "https://idp.test/authorize");
	assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn implicit_denial_is_reported_in_outcome() {
	let authorizer = Arc::new(ScriptedAuthorizer::default());
	let (engine, store) = build_reqwest_test_engine(authorizer.clone());
	let config = OAuth2Config::new(OAuth2Grant::Implicit(ImplicitGrant {
		authorization_url: Some("https://idp.test/authorize".into()),
		callback_url: Some(CALLBACK.into()),
		..Default::default()
	}));

	authorizer.push(callback(&format!("{CALLBACK}#error=access_denied"), ResponseType::Token));

	let outcome = engine
		.credentials(CredentialsRequest::new(collection_uid(), config))
		.await
		.expect("Implicit failures are reported in the outcome.");

	assert_eq!(outcome.source, CredentialsSource::Failed);
	assert!(outcome.error.is_some_and(|error| error.contains("access_denied")));
	assert!(store.is_empty());
}
