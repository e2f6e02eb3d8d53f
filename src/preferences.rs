//! Read-only application preferences consumed during preparation.

// self
use crate::{_prelude::*, error::ConfigError, network::GlobalProxy};

/// Preferences provider.
pub trait Preferences
where
	Self: Send + Sync,
{
	/// Whether server certificates are verified.
	fn verify_tls(&self) -> bool;

	/// Custom CA bundle to trust, when one is enabled.
	fn custom_ca_certificate(&self) -> Option<&Path>;

	/// Whether built-in roots stay trusted next to the custom CA bundle.
	fn keep_default_ca_certificates(&self) -> bool;

	/// Application-wide proxy setting.
	fn global_proxy(&self) -> &GlobalProxy;

	/// Whether interactive authorization opens the system browser instead of an embedded window.
	fn use_system_browser(&self) -> bool;
}

/// In-memory preferences decoded from JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StaticPreferences {
	/// TLS settings.
	pub request: RequestPreferences,
	/// Global proxy.
	pub proxy: GlobalProxy,
	/// Open authorization pages in the system browser.
	pub use_system_browser: bool,
}
impl Default for StaticPreferences {
	fn default() -> Self {
		Self { request: RequestPreferences::default(), proxy: GlobalProxy::Off, use_system_browser: false }
	}
}
impl StaticPreferences {
	/// Decodes preferences, reporting the JSON path of the first invalid field.
	pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(raw);

		Ok(serde_path_to_error::deserialize(&mut de)?)
	}

	/// Replaces the global proxy.
	pub fn with_proxy(mut self, proxy: GlobalProxy) -> Self {
		self.proxy = proxy;

		self
	}
}
impl Preferences for StaticPreferences {
	fn verify_tls(&self) -> bool {
		self.request.ssl_verification
	}

	fn custom_ca_certificate(&self) -> Option<&Path> {
		let ca = &self.request.custom_ca_certificate;

		if ca.enabled { ca.file_path.as_deref() } else { None }
	}

	fn keep_default_ca_certificates(&self) -> bool {
		self.request.keep_default_ca_certificates
	}

	fn global_proxy(&self) -> &GlobalProxy {
		&self.proxy
	}

	fn use_system_browser(&self) -> bool {
		self.use_system_browser
	}
}

/// TLS preferences.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestPreferences {
	/// Verify server certificates.
	pub ssl_verification: bool,
	/// Custom CA bundle.
	pub custom_ca_certificate: CustomCaCertificate,
	/// Keep built-in roots when a custom bundle is used.
	pub keep_default_ca_certificates: bool,
}
impl Default for RequestPreferences {
	fn default() -> Self {
		Self {
			ssl_verification: true,
			custom_ca_certificate: CustomCaCertificate::default(),
			keep_default_ca_certificates: true,
		}
	}
}

/// Custom CA bundle switch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomCaCertificate {
	/// Use the bundle.
	pub enabled: bool,
	/// Bundle path.
	pub file_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_verify_tls_without_proxy() {
		let prefs = StaticPreferences::from_json("{}").expect("Empty preferences should decode.");

		assert!(prefs.verify_tls());
		assert!(prefs.keep_default_ca_certificates());
		assert_eq!(prefs.global_proxy(), &GlobalProxy::Off);
		assert_eq!(prefs.custom_ca_certificate(), None);
	}

	#[test]
	fn custom_ca_requires_the_switch() {
		let prefs = StaticPreferences::from_json(
			r#"{"request":{"customCaCertificate":{"enabled":false,"filePath":"/ca.pem"}}}"#,
		)
		.expect("Preferences should decode.");

		assert_eq!(prefs.custom_ca_certificate(), None);
	}

	#[test]
	fn decode_errors_carry_the_field_path() {
		let err = StaticPreferences::from_json(r#"{"request":{"sslVerification":"yes"}}"#)
			.expect_err("A string is not a bool.");
		let ConfigError::Settings(inner) = err else {
			panic!("Expected a settings error.");
		};

		assert_eq!(inner.path().to_string(), "request.sslVerification");
	}
}
