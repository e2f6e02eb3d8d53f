//! TLS and proxy resolution for outbound calls.

pub mod bypass;
pub mod cert;
pub mod proxy;
pub mod system;

pub use bypass::*;
pub use cert::*;
pub use proxy::*;
pub use system::*;

// self
use crate::{_prelude::*, interpolate::Interpolator, preferences::Preferences, tree::Collection};

/// Everything a transport needs to open a connection for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportSettings {
	/// Verify server certificates.
	pub verify_tls: bool,
	/// Extra trusted CA bundle (PEM).
	pub ca_certificate: Option<Vec<u8>>,
	/// Keep built-in roots next to `ca_certificate`.
	pub keep_default_ca_certificates: bool,
	/// Client identity selected by domain match.
	pub identity: Option<ClientIdentity>,
	/// Proxy routing.
	pub proxy: ResolvedProxy,
}
impl Default for TransportSettings {
	fn default() -> Self {
		Self {
			verify_tls: true,
			ca_certificate: None,
			keep_default_ca_certificates: true,
			identity: None,
			proxy: ResolvedProxy::default(),
		}
	}
}
impl TransportSettings {
	/// Returns `true` when a stock client can serve the request.
	pub fn is_default(&self) -> bool {
		self == &Self::default()
	}
}

/// Resolves TLS material and proxy routing for requests of one collection.
pub struct NetworkResolver<'a> {
	collection: &'a Collection,
	preferences: &'a dyn Preferences,
	interpolator: &'a Interpolator,
	system_proxy: Option<SystemProxy>,
}
impl<'a> NetworkResolver<'a> {
	/// Creates a resolver; placeholders in rules and proxy settings use `interpolator`.
	pub fn new(
		collection: &'a Collection,
		preferences: &'a dyn Preferences,
		interpolator: &'a Interpolator,
	) -> Self {
		Self { collection, preferences, interpolator, system_proxy: None }
	}

	/// Uses a fixed system proxy instead of probing the environment.
	pub fn with_system_proxy(mut self, system_proxy: SystemProxy) -> Self {
		self.system_proxy = Some(system_proxy);

		self
	}

	/// Resolves settings for an interpolated request URL.
	///
	/// Unreadable certificate material is an error rather than a silent downgrade.
	pub fn resolve(&self, url: &str) -> Result<TransportSettings> {
		let ca_certificate = self
			.preferences
			.custom_ca_certificate()
			.map(|path| {
				std::fs::read(path)
					.map_err(|source| Error::Certificate { path: path.to_path_buf(), source })
			})
			.transpose()?;
		let identity = match_client_certificate(
			&self.collection.settings.client_certificates,
			url,
			self.interpolator,
		)
		.map(|rule| rule.load(&self.collection.pathname, self.interpolator))
		.transpose()?;
		let proxy = resolve_proxy(
			&self.collection.settings.proxy,
			self.preferences.global_proxy(),
			url,
			self.interpolator,
			|| self.system_proxy.clone().unwrap_or_else(SystemProxy::detect),
		)?;

		Ok(TransportSettings {
			verify_tls: self.preferences.verify_tls(),
			ca_certificate,
			keep_default_ca_certificates: self.preferences.keep_default_ca_certificates(),
			identity,
			proxy,
		})
	}
}
