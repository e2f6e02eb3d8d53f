//! Form-encoded token endpoint calls.
//!
//! [`TokenForm`] collects the URL, headers and body of one call. Client credentials go either in
//! the body or in a Basic `Authorization` header, never both.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{self, Method},
};
// self
use crate::{
	_prelude::*,
	auth::{
		AdditionalParameter, CredentialsPlacement, CredentialsRejection, OAuth2Credentials,
		ParameterTarget,
	},
	error::{ConfigError, TransportError},
	flows::{DebugEntry, DebugRequest, DebugResponse, DebugTrail, OAuth2Engine, pkce},
	http::{ResponseMetadataSlot, TokenHttpClient},
	network::TransportSettings,
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const REQUEST_ID_LEN: usize = 16;

/// Result of a token endpoint call that produced a response.
#[derive(Clone, Debug, PartialEq)]
pub enum Exchange {
	/// Usable credentials.
	Issued(OAuth2Credentials),
	/// Validation failure, non-2xx answer, or a payload without a usable token.
	Rejected(String),
}

/// Outbound token endpoint call.
#[derive(Clone, Debug)]
pub struct TokenForm {
	url: Url,
	headers: Vec<(String, String)>,
	body: Vec<(String, String)>,
}
impl TokenForm {
	/// Starts a `POST` to `url` carrying `grant_type`.
	pub fn new(url: Url, grant_type: &str) -> Self {
		Self {
			url,
			headers: vec![
				("Content-Type".into(), FORM_CONTENT_TYPE.into()),
				("Accept".into(), "application/json".into()),
			],
			body: vec![("grant_type".into(), grant_type.into())],
		}
	}

	/// Appends a body field.
	pub fn param(mut self, name: &str, value: impl Into<String>) -> Self {
		self.body.push((name.into(), value.into()));

		self
	}

	/// Appends a body field when `value` is present.
	pub fn optional_param(self, name: &str, value: Option<&str>) -> Self {
		match value {
			Some(value) => self.param(name, value),
			None => self,
		}
	}

	/// Applies client authentication per `placement`.
	pub fn client_auth(
		mut self,
		client_id: Option<&str>,
		client_secret: Option<&str>,
		placement: CredentialsPlacement,
	) -> Self {
		match placement {
			CredentialsPlacement::Body => self
				.optional_param("client_id", client_id)
				.optional_param("client_secret", client_secret),
			CredentialsPlacement::BasicAuthHeader => {
				let pair = format!(
					"{}:{}",
					client_id.unwrap_or_default(),
					client_secret.unwrap_or_default()
				);

				self.headers.push(("Authorization".into(), format!("Basic {}", STANDARD.encode(pair))));

				self
			},
		}
	}

	/// Applies the active entries of an additional parameter list.
	pub fn additional(mut self, params: &[AdditionalParameter]) -> Self {
		for param in params.iter().filter(|param| param.is_active()) {
			match param.send_in {
				ParameterTarget::Headers =>
					self.headers.push((param.name.clone(), param.value.clone())),
				ParameterTarget::QueryParams => {
					self.url.query_pairs_mut().append_pair(&param.name, &param.value);
				},
				ParameterTarget::Body => self.body.push((param.name.clone(), param.value.clone())),
			}
		}

		self
	}

	/// Target URL including any query parameters.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// Header lines.
	pub fn headers(&self) -> &[(String, String)] {
		&self.headers
	}

	/// Body fields.
	pub fn body(&self) -> &[(String, String)] {
		&self.body
	}

	/// Debug view of the call.
	pub fn to_debug_request(&self) -> DebugRequest {
		DebugRequest {
			url: self.url.to_string(),
			method: Method::POST.to_string(),
			headers: self.headers.clone(),
			body: self.encoded_body(),
		}
	}

	/// Builds the HTTP request handed to the transport.
	pub fn to_http_request(&self) -> Result<HttpRequest, ConfigError> {
		let mut builder = http::Request::builder().method(Method::POST).uri(self.url.as_str());

		for (name, value) in &self.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}

		Ok(builder.body(self.encoded_body().into_bytes())?)
	}

	fn encoded_body(&self) -> String {
		url::form_urlencoded::Serializer::new(String::new()).extend_pairs(&self.body).finish()
	}
}

impl<C> OAuth2Engine<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Sends `form` and records the call in `debug`.
	///
	/// A response of any status yields an [`Exchange`]. A call that never produced a response
	/// fails with [`Error::TokenEndpoint`], which takes ownership of the trail recorded so far.
	pub(crate) async fn exchange(
		&self,
		form: TokenForm,
		transport: &TransportSettings,
		debug: &mut DebugTrail,
	) -> Result<Exchange> {
		let slot = ResponseMetadataSlot::default();
		let request = form.to_http_request()?;
		let request_id = pkce::random_string(REQUEST_ID_LEN);
		let url = form.url().to_string();
		let handle = match self.http_client.with_metadata(transport, slot.clone()) {
			Ok(handle) => handle,
			Err(e) => {
				let message = e.to_string();

				debug.push(DebugEntry {
					request_id,
					request: form.to_debug_request(),
					response: DebugResponse {
						url,
						error: Some(message.clone()),
						..Default::default()
					},
				});

				return Err(Error::TokenEndpoint {
					message,
					debug: Box::new(std::mem::take(debug)),
					source: e.into(),
				});
			},
		};

		match handle.call(request).await {
			Ok(response) => {
				let created_at = OffsetDateTime::now_utc();
				let elapsed_ms = slot
					.take()
					.and_then(|meta| meta.elapsed)
					.and_then(|elapsed| u64::try_from(elapsed.whole_milliseconds()).ok());

				debug.push(DebugEntry {
					request_id,
					request: form.to_debug_request(),
					response: describe_response(url, &response, elapsed_ms),
				});

				Ok(interpret(&response, created_at))
			},
			Err(e) => {
				let status = slot.take().and_then(|meta| meta.status);
				let (message, source) = map_transport_error(e);

				debug.push(DebugEntry {
					request_id,
					request: form.to_debug_request(),
					response: DebugResponse {
						url,
						status,
						error: Some(message.clone()),
						..Default::default()
					},
				});

				Err(Error::TokenEndpoint { message, debug: Box::new(std::mem::take(debug)), source })
			},
		}
	}
}

/// Turns a token endpoint response into an [`Exchange`].
///
/// Non-2xx answers and payloads carrying `error` or lacking `access_token` are rejections.
pub fn interpret(response: &HttpResponse, created_at: OffsetDateTime) -> Exchange {
	let status = response.status();
	let payload = OAuth2Credentials::parse_body(response.body());

	if !status.is_success() {
		let message = match payload.map(|map| OAuth2Credentials::from_payload(&map, created_at)) {
			Ok(Err(rejection @ CredentialsRejection::Provider { .. })) => rejection.to_string(),
			_ => format!("Token endpoint responded with HTTP {}.", status.as_u16()),
		};

		return Exchange::Rejected(message);
	}

	match payload.and_then(|map| OAuth2Credentials::from_payload(&map, created_at)) {
		Ok(credentials) => Exchange::Issued(credentials),
		Err(rejection) => Exchange::Rejected(rejection.to_string()),
	}
}

fn describe_response(url: String, response: &HttpResponse, elapsed_ms: Option<u64>) -> DebugResponse {
	let body = response.body();

	DebugResponse {
		url,
		status: Some(response.status().as_u16()),
		status_text: response.status().canonical_reason().map(str::to_owned),
		headers: response
			.headers()
			.iter()
			.map(|(name, value)| {
				(name.as_str().to_owned(), String::from_utf8_lossy(value.as_bytes()).into_owned())
			})
			.collect(),
		body: (!body.is_empty()).then(|| {
			serde_json::from_slice(body)
				.unwrap_or_else(|_| JsonValue::String(String::from_utf8_lossy(body).into_owned()))
		}),
		elapsed_ms,
		error: None,
	}
}

fn map_transport_error<E>(err: HttpClientError<E>) -> (String, TransportError)
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => (inner.to_string(), TransportError::network(*inner)),
		HttpClientError::Http(inner) => (inner.to_string(), TransportError::network(inner)),
		HttpClientError::Io(inner) => (inner.to_string(), TransportError::Io(inner)),
		HttpClientError::Other(message) =>
			(message.clone(), TransportError::Io(std::io::Error::other(message))),
		other => {
			let message = other.to_string();

			(message.clone(), TransportError::Io(std::io::Error::other(message)))
		},
	}
}
