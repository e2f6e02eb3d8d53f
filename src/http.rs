//! Transport primitives for token endpoint calls.
//!
//! [`TokenHttpClient`] hands out short-lived [`AsyncHttpClient`] handles configured for one
//! call's [`TransportSettings`] (trust roots, client identity, proxy). Each handle reports the
//! response status and timing through a [`ResponseMetadataSlot`] so the debug trail can record
//! them even when the body cannot be read.

// std
use std::{ops::Deref, time::Instant};
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::{_prelude::*, error::ConfigError, network::TransportSettings};

/// Abstraction over HTTP transports capable of executing token endpoint calls.
///
/// Implementations must be `Send + Sync + 'static` so one engine can be shared across tasks,
/// and the handles they return must own whatever state their request futures need so those
/// futures stay `Send`.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle tied to a [`ResponseMetadataSlot`].
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a handle honoring `transport` that records outcomes in `slot`.
	///
	/// # Metadata Contract
	///
	/// - Call [`ResponseMetadataSlot::take`] before submitting the request so stale information
	///   never leaks across calls.
	/// - Once a response status is known, save it with [`ResponseMetadataSlot::store`].
	fn with_metadata(
		&self,
		transport: &TransportSettings,
		slot: ResponseMetadataSlot,
	) -> Result<Self::Handle, ConfigError>;
}

/// Metadata from the most recent HTTP response.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code, if a response arrived.
	pub status: Option<u16>,
	/// Time from dispatch until the body was read.
	pub elapsed: Option<Duration>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and engine.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`].
///
/// The wrapped client serves calls whose [`TransportSettings`] are the defaults; any custom
/// trust root, identity, proxy or disabled verification gets a dedicated client. Token endpoints
/// answer directly, so dedicated clients never follow redirects; configure a custom wrapped client
/// the same way.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client for `settings`.
	pub fn from_settings(settings: &TransportSettings) -> Result<Self, ConfigError> {
		build_client(settings).map(Self)
	}

	pub(crate) fn instrumented(
		&self,
		transport: &TransportSettings,
		slot: ResponseMetadataSlot,
	) -> Result<InstrumentedHandle, ConfigError> {
		let client = if transport.is_default() { self.0.clone() } else { build_client(transport)? };

		Ok(InstrumentedHandle::new(client, slot))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

#[cfg(feature = "reqwest")]
/// Instrumented adapter that implements [`AsyncHttpClient`] for reqwest.
pub(crate) struct InstrumentedHttpClient {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}

#[cfg(feature = "reqwest")]
/// Handle returned by [`ReqwestHttpClient`] that satisfies [`TokenHttpClient`].
#[derive(Clone)]
pub struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
#[cfg(feature = "reqwest")]
impl InstrumentedHandle {
	fn new(client: ReqwestClient, slot: ResponseMetadataSlot) -> Self {
		Self(Arc::new(InstrumentedHttpClient { client, slot }))
	}
}
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			client.slot.take();

			let started = Instant::now();
			let response = client
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(Box::new)?;

			client.slot.store(ResponseMetadata {
				status: Some(status.as_u16()),
				elapsed: Duration::try_from(started.elapsed()).ok(),
			});

			let mut response_new = HttpResponse::new(body.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	type Handle = InstrumentedHandle;
	type TransportError = ReqwestError;

	fn with_metadata(
		&self,
		transport: &TransportSettings,
		slot: ResponseMetadataSlot,
	) -> Result<Self::Handle, ConfigError> {
		self.instrumented(transport, slot)
	}
}

/// Builds a reqwest client honoring trust, identity and proxy settings.
///
/// PKCS#12 archives and passphrase-protected keys are opened up front and handed to rustls as
/// a plain PEM bundle.
#[cfg(feature = "reqwest")]
pub fn build_client(settings: &TransportSettings) -> Result<ReqwestClient, ConfigError> {
	let mut builder = ReqwestClient::builder().redirect(reqwest::redirect::Policy::none());

	if !settings.verify_tls {
		builder = builder.danger_accept_invalid_certs(true);
	}
	if let Some(pem) = &settings.ca_certificate {
		builder = builder.add_root_certificate(reqwest::Certificate::from_pem(pem)?);

		if !settings.keep_default_ca_certificates {
			builder = builder.tls_built_in_root_certs(false);
		}
	}

	if let Some(identity) = &settings.identity {
		builder = builder.identity(reqwest::Identity::from_pem(&identity.pem_bundle()?)?);
	}

	if settings.proxy.is_direct() {
		builder = builder.no_proxy();
	}
	if let Some(uri) = &settings.proxy.http {
		builder = builder.proxy(reqwest::Proxy::http(uri)?);
	}
	if let Some(uri) = &settings.proxy.https {
		builder = builder.proxy(reqwest::Proxy::https(uri)?);
	}

	Ok(builder.build()?)
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::network::{
		ClientIdentity, ResolvedProxy,
		cert::tests::{encrypted_pem_identity, pfx_identity},
	};

	#[test]
	fn sealed_identities_build_clients() {
		for identity in [pfx_identity("s3cret"), encrypted_pem_identity("pw")] {
			let settings = TransportSettings { identity: Some(identity), ..Default::default() };

			build_client(&settings).expect("Sealed identities should be presented.");
		}
	}

	#[test]
	fn corrupt_archives_fail_client_construction() {
		let settings = TransportSettings {
			identity: Some(ClientIdentity::Pfx { archive: vec![1, 2, 3], passphrase: None }),
			..Default::default()
		};
		let err = build_client(&settings).err().expect("Garbage archives must be rejected.");

		assert!(matches!(err, ConfigError::InvalidIdentity { kind: "pfx", .. }));
	}

	#[test]
	fn proxies_and_disabled_verification_build() {
		let settings = TransportSettings {
			verify_tls: false,
			proxy: ResolvedProxy {
				http: Some("http://proxy.test:3128".into()),
				https: Some("http://proxy.test:3128".into()),
				..Default::default()
			},
			..Default::default()
		};

		assert!(build_client(&settings).is_ok());
	}

	#[test]
	fn metadata_slot_is_consumed_on_take() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(200), elapsed: None });

		assert_eq!(slot.take().and_then(|meta| meta.status), Some(200));
		assert!(slot.take().is_none());
	}
}
