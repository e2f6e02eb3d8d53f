//! Refresh token exchanges.
//!
//! Refreshes POST to the refresh URL, falling back to the access token URL, while the credentials
//! stay keyed by the access token URL. A refresh response replaces the stored credentials
//! wholesale; a refresh token missing from the response is not carried over. Any failed refresh
//! drops the stored credentials.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::OAuth2Config,
	flows::{
		CredentialsOutcome, CredentialsRequest, CredentialsSource, DebugTrail, Exchange,
		OAuth2Engine, TokenForm, endpoint,
	},
	http::TokenHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Builds a refresh request for `config`.
pub fn refresh_form(config: &OAuth2Config, refresh_token: &str) -> Result<TokenForm, String> {
	let url = config.refresh_url().ok_or_else(|| {
		format!("Refresh is not available for the OAuth2 {} flow", config.grant.as_str())
	})?;
	let (client_id, client_secret, placement) = config.client();

	Ok(TokenForm::new(endpoint(url, "Refresh Token URL")?, "refresh_token")
		.param("refresh_token", refresh_token)
		.client_auth(client_id, client_secret, placement)
		.additional(&config.additional_parameters.refresh))
}

impl<C> OAuth2Engine<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Refreshes the stored credentials regardless of their expiry.
	///
	/// Without a stored refresh token the outcome carries an error and nothing changes. A rejected
	/// refresh drops the stored credentials and reports the provider's message; an unreachable
	/// endpoint drops them too and fails with [`Error::TokenEndpoint`].
	pub async fn refresh(&self, request: CredentialsRequest) -> Result<CredentialsOutcome> {
		let key = request.key();
		let mut debug = DebugTrail::default();
		let Some(refresh_token) =
			self.store.get(&key).await?.and_then(|credentials| credentials.refresh_token)
		else {
			return Ok(request.outcome(
				CredentialsSource::Failed,
				None,
				Some("No refresh token is stored for these credentials".into()),
				debug,
			));
		};

		match self.refresh_exchange(&request, refresh_token.expose(), &mut debug).await {
			Ok(Exchange::Issued(fresh)) => {
				self.store.set(key, fresh.clone()).await?;

				Ok(request.outcome(CredentialsSource::Refreshed, Some(fresh), None, debug))
			},
			Ok(Exchange::Rejected(message)) => {
				self.store.clear(&key).await?;

				Ok(request.outcome(CredentialsSource::Failed, None, Some(message), debug))
			},
			Err(e) => {
				if matches!(e, Error::TokenEndpoint { .. }) {
					self.store.clear(&key).await?;
				}

				Err(e)
			},
		}
	}

	pub(crate) async fn refresh_exchange(
		&self,
		request: &CredentialsRequest,
		refresh_token: &str,
		debug: &mut DebugTrail,
	) -> Result<Exchange> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, request);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let result = match refresh_form(&request.config, refresh_token) {
			Ok(form) => span.instrument(self.exchange(form, &request.transport, debug)).await,
			Err(message) => Ok(Exchange::Rejected(message)),
		};

		match &result {
			Ok(Exchange::Issued(_)) => {
				self.refresh_metrics.record_success();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
			},
			_ => {
				self.refresh_metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}
}
