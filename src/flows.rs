//! OAuth2 credential lifecycle: cache lookup, expiry, refresh, and acquisition per grant.
//!
//! [`OAuth2Engine::credentials`] drives one store slot, keyed by
//! `(collection, token URL, credentials id)`, through its states:
//!
//! - no entry: fetch when `autoFetchToken` is set, otherwise return nothing;
//! - fresh entry: return it without network traffic;
//! - expired entry: refresh when `autoRefreshToken` is set and a refresh token exists; when the
//!   refresh fails or is not possible, drop the entry and fetch if `autoFetchToken` is set,
//!   otherwise return the expired entry unchanged.
//!
//! Missing configuration and provider rejections are reported through
//! [`CredentialsOutcome::error`]. Only store failures, authorization failures of the code grant,
//! and unreachable token endpoints surface as [`Error`].
//!
//! Concurrent calls for one slot are not coordinated; both may refresh and the last write wins.

pub mod authorization_code;
pub mod client_credentials;
pub mod debug;
pub mod exchange;
pub mod implicit;
pub mod password;
pub mod pkce;
pub mod refresh;

pub use authorization_code::*;
pub use client_credentials::*;
pub use debug::*;
pub use exchange::*;
pub use implicit::*;
pub use password::*;
pub use refresh::*;

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{AdditionalParameter, CollectionUid, OAuth2Config, OAuth2Credentials, OAuth2Grant, ParameterTarget},
	authorize::{AuthorizeError, AuthorizeRequest, Authorizer, ResponseType},
	http::TokenHttpClient,
	network::TransportSettings,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{TokenStore, TokenStoreKey},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Engine specialized for the crate's default reqwest transport.
pub type ReqwestEngine = OAuth2Engine<ReqwestHttpClient>;

/// Runs OAuth2 grants and keeps their credentials in a [`TokenStore`].
///
/// The engine owns the token endpoint transport, the store, and the interactive
/// [`Authorizer`]; everything grant-specific arrives per call in a [`CredentialsRequest`].
#[derive(Clone)]
pub struct OAuth2Engine<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Transport used for every token endpoint call.
	pub http_client: Arc<C>,
	/// Credential cache.
	pub store: Arc<dyn TokenStore>,
	/// Interactive authorization surface for the code and implicit grants.
	pub authorizer: Arc<dyn Authorizer>,
	/// Shared counters for refresh exchanges.
	pub refresh_metrics: Arc<RefreshMetrics>,
}
impl<C> OAuth2Engine<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates an engine around a caller-provided transport.
	pub fn with_http_client(
		store: Arc<dyn TokenStore>,
		authorizer: Arc<dyn Authorizer>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self { http_client: http_client.into(), store, authorizer, refresh_metrics: Default::default() }
	}

	/// Returns usable credentials for the slot described by `request`.
	pub async fn credentials(&self, request: CredentialsRequest) -> Result<CredentialsOutcome> {
		let key = request.key();
		let kind = FlowKind::from(&request.config.grant);
		let mut debug = DebugTrail::default();

		if request.force {
			self.store.clear(&key).await?;
		}

		let Some(current) = self.store.get(&key).await? else {
			if !request.config.auto_fetch_token {
				return Ok(request.outcome(CredentialsSource::Skipped, None, None, debug));
			}

			return self.fetch(&request, &key, debug).await;
		};

		if !current.is_expired() {
			obs::record_flow_outcome(kind, FlowOutcome::CacheHit);

			return Ok(request.outcome(CredentialsSource::Cached, Some(current), None, debug));
		}

		let refresh_token = current
			.refresh_token
			.clone()
			.filter(|_| request.config.auto_refresh_token && kind != FlowKind::Implicit);

		if let Some(refresh_token) = refresh_token {
			match self.refresh_exchange(&request, refresh_token.expose(), &mut debug).await {
				Ok(Exchange::Issued(fresh)) => {
					self.store.set(key, fresh.clone()).await?;

					return Ok(request.outcome(CredentialsSource::Refreshed, Some(fresh), None, debug));
				},
				Ok(Exchange::Rejected(_)) => {},
				Err(Error::TokenEndpoint { debug: trail, .. }) => debug = *trail,
				Err(e) => return Err(e),
			}

			self.store.clear(&key).await?;
		}
		if !request.config.auto_fetch_token {
			obs::record_flow_outcome(kind, FlowOutcome::Stale);

			return Ok(request.outcome(CredentialsSource::Stale, Some(current), None, debug));
		}

		self.store.clear(&key).await?;
		self.fetch(&request, &key, debug).await
	}

	/// Drops the credentials stored for `config` in `collection_uid`.
	pub async fn clear(
		&self,
		collection_uid: &CollectionUid,
		config: &OAuth2Config,
	) -> Result<Option<OAuth2Credentials>> {
		let key = store_key(collection_uid, config);

		Ok(self.store.clear(&key).await?)
	}

	async fn fetch(
		&self,
		request: &CredentialsRequest,
		key: &TokenStoreKey,
		mut debug: DebugTrail,
	) -> Result<CredentialsOutcome> {
		let kind = FlowKind::from(&request.config.grant);
		let span = FlowSpan::new(kind, request);

		obs::record_flow_outcome(kind, FlowOutcome::Attempt);

		let exchange = match span.instrument(self.acquire(request, &mut debug)).await {
			Ok(exchange) => exchange,
			Err(e) => {
				obs::record_flow_outcome(kind, FlowOutcome::Failure);

				return Err(e);
			},
		};

		match exchange {
			Exchange::Issued(credentials) => {
				self.store.set(key.clone(), credentials.clone()).await?;
				obs::record_flow_outcome(kind, FlowOutcome::Success);

				Ok(request.outcome(CredentialsSource::Fetched, Some(credentials), None, debug))
			},
			Exchange::Rejected(message) => {
				obs::record_flow_outcome(kind, FlowOutcome::Failure);

				Ok(request.outcome(CredentialsSource::Failed, None, Some(message), debug))
			},
		}
	}

	async fn acquire(
		&self,
		request: &CredentialsRequest,
		debug: &mut DebugTrail,
	) -> Result<Exchange> {
		match &request.config.grant {
			OAuth2Grant::AuthorizationCode(grant) =>
				self.authorization_code(request, grant, debug).await,
			OAuth2Grant::ClientCredentials(grant) =>
				self.client_credentials(request, grant, debug).await,
			OAuth2Grant::Password(grant) => self.password(request, grant, debug).await,
			OAuth2Grant::Implicit(grant) => self.implicit(request, grant).await,
		}
	}
}
#[cfg(feature = "reqwest")]
impl OAuth2Engine<ReqwestHttpClient> {
	/// Creates an engine with a default reqwest transport.
	pub fn new(store: Arc<dyn TokenStore>, authorizer: Arc<dyn Authorizer>) -> Self {
		Self::with_http_client(store, authorizer, ReqwestHttpClient::default())
	}
}
impl<C> Debug for OAuth2Engine<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2Engine")
			.field("refresh_attempts", &self.refresh_metrics.attempts())
			.finish_non_exhaustive()
	}
}

/// Input to [`OAuth2Engine::credentials`] and [`OAuth2Engine::refresh`].
#[derive(Clone, Debug)]
pub struct CredentialsRequest {
	/// Owning collection.
	pub collection_uid: CollectionUid,
	/// Interpolated OAuth2 block.
	pub config: OAuth2Config,
	/// TLS and proxy settings for the token endpoint.
	pub transport: TransportSettings,
	/// Drop any stored credentials before evaluating the slot.
	pub force: bool,
}
impl CredentialsRequest {
	/// Creates a request with default transport settings.
	pub fn new(collection_uid: CollectionUid, config: OAuth2Config) -> Self {
		Self { collection_uid, config, transport: TransportSettings::default(), force: false }
	}

	/// Overrides the transport settings.
	pub fn with_transport(mut self, transport: TransportSettings) -> Self {
		self.transport = transport;

		self
	}

	/// Ignores stored credentials and acquires new ones.
	pub fn force_fetch(mut self) -> Self {
		self.force = true;

		self
	}

	/// Store slot for this request.
	pub fn key(&self) -> TokenStoreKey {
		store_key(&self.collection_uid, &self.config)
	}

	fn outcome(
		&self,
		source: CredentialsSource,
		credentials: Option<OAuth2Credentials>,
		error: Option<String>,
		debug: DebugTrail,
	) -> CredentialsOutcome {
		CredentialsOutcome {
			url: self.config.store_url().to_owned(),
			credentials_id: self.config.credentials_id.clone(),
			credentials,
			error,
			source,
			debug,
		}
	}
}

/// How the credentials in a [`CredentialsOutcome`] were obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialsSource {
	/// Fresh entry from the store.
	Cached,
	/// Expired entry returned because fetching is disabled.
	Stale,
	/// New credentials from a refresh exchange.
	Refreshed,
	/// New credentials from a full grant.
	Fetched,
	/// Nothing stored and fetching is disabled.
	Skipped,
	/// The grant was rejected or misconfigured; see [`CredentialsOutcome::error`].
	Failed,
}

/// Result of a credential operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsOutcome {
	/// Store slot URL.
	pub url: String,
	/// Credentials identifier.
	pub credentials_id: String,
	/// Credentials to use, if any.
	pub credentials: Option<OAuth2Credentials>,
	/// Validation or provider error; `credentials` is `None` when set.
	pub error: Option<String>,
	/// Provenance of `credentials`.
	pub source: CredentialsSource,
	/// Token endpoint calls made by this operation.
	pub debug: DebugTrail,
}
impl CredentialsOutcome {
	/// Access token, when credentials are present.
	pub fn access_token(&self) -> Option<&str> {
		self.credentials.as_ref().map(|credentials| credentials.access_token.expose())
	}
}

/// Stable digest of a credential slot, handed to the authorizer as its session id.
pub fn session_id(collection_uid: &str, url: &str) -> String {
	format!("{:x}", Sha256::digest(format!("{collection_uid}|{url}").as_bytes()))
}

fn store_key(collection_uid: &CollectionUid, config: &OAuth2Config) -> TokenStoreKey {
	TokenStoreKey::new(collection_uid.clone(), config.store_url(), config.credentials_id.clone())
}

/// Returns the field value or the validation message naming it.
pub(crate) fn required<'a>(
	value: &'a Option<String>,
	field: &str,
	flow: &str,
) -> Result<&'a str, String> {
	crate::auth::present(value).ok_or_else(|| format!("{field} is required for {flow}"))
}

pub(crate) fn endpoint(value: &str, field: &str) -> Result<Url, String> {
	Url::parse(value.trim()).map_err(|e| format!("{field} is not a valid URL: {e}"))
}

/// Finishes an authorization request: query-targeted extras join the URL, header-targeted ones
/// travel to the authorizer. Body-targeted extras do not apply to a browser navigation.
pub(crate) fn authorize_request(
	mut authorize_url: Url,
	callback_url: &str,
	session_id: String,
	response_type: ResponseType,
	params: &[AdditionalParameter],
) -> AuthorizeRequest {
	let mut additional_headers = Vec::new();

	for param in params.iter().filter(|param| param.is_active()) {
		match param.send_in {
			ParameterTarget::QueryParams => {
				authorize_url.query_pairs_mut().append_pair(&param.name, &param.value);
			},
			ParameterTarget::Headers =>
				additional_headers.push((param.name.clone(), param.value.clone())),
			ParameterTarget::Body => {},
		}
	}

	AuthorizeRequest {
		authorize_url,
		callback_url: callback_url.to_owned(),
		session_id,
		response_type,
		additional_headers,
	}
}

/// Compares the returned `state` with the configured one when both exist.
pub(crate) fn verify_state(
	expected: Option<&str>,
	returned: Option<&str>,
) -> Result<(), AuthorizeError> {
	match (expected, returned) {
		(Some(expected), Some(returned)) if expected != returned =>
			Err(AuthorizeError::StateMismatch),
		_ => Ok(()),
	}
}
