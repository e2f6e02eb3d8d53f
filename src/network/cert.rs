//! Client certificate rules and domain matching.

// crates.io
use openssl::{error::ErrorStack, pkcs12::Pkcs12, pkey::PKey};
use regex::Regex;
// self
use crate::{_prelude::*, error::ConfigError, interpolate::Interpolator};

/// Client certificate configuration of a collection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientCertificates {
	/// Rules in evaluation order; the first match wins.
	pub certs: Vec<ClientCertRule>,
}

/// Kind of material a rule points at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientCertKind {
	/// PEM certificate plus PEM private key.
	#[default]
	Cert,
	/// PKCS#12 archive.
	Pfx,
}

/// Client certificate bound to a domain pattern.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientCertRule {
	/// Domain pattern; `*` is a wildcard. May contain placeholders.
	pub domain: String,
	/// Material kind.
	#[serde(rename = "type")]
	pub kind: ClientCertKind,
	/// Certificate path for [`ClientCertKind::Cert`].
	pub cert_file_path: String,
	/// Key path for [`ClientCertKind::Cert`].
	pub key_file_path: String,
	/// Archive path for [`ClientCertKind::Pfx`].
	pub pfx_file_path: String,
	/// Key or archive passphrase.
	pub passphrase: String,
}
impl ClientCertRule {
	/// Creates a PEM rule.
	pub fn pem(
		domain: impl Into<String>,
		cert_file_path: impl Into<String>,
		key_file_path: impl Into<String>,
	) -> Self {
		Self {
			domain: domain.into(),
			cert_file_path: cert_file_path.into(),
			key_file_path: key_file_path.into(),
			..Default::default()
		}
	}

	/// Creates a PKCS#12 rule.
	pub fn pfx(domain: impl Into<String>, pfx_file_path: impl Into<String>) -> Self {
		Self {
			domain: domain.into(),
			kind: ClientCertKind::Pfx,
			pfx_file_path: pfx_file_path.into(),
			..Default::default()
		}
	}

	/// Tests the interpolated domain pattern against an interpolated request URL.
	///
	/// The pattern is anchored at the start, optionally after an `https://`, `grpc://` or
	/// `grpcs://` scheme, and is open-ended on the right.
	pub fn matches(&self, url: &str, interpolator: &Interpolator) -> bool {
		let domain = interpolator.interpolate(&self.domain);

		if domain.trim().is_empty() {
			return false;
		}

		let pattern = format!(
			"^(https://|grpc://|grpcs://)?{}",
			regex::escape(&domain).replace(r"\*", ".*")
		);

		Regex::new(&pattern).map(|re| re.is_match(url)).unwrap_or(false)
	}

	/// Reads the rule's material, resolving relative paths against `collection_path`.
	pub fn load(&self, collection_path: &Path, interpolator: &Interpolator) -> Result<ClientIdentity> {
		let passphrase = Some(interpolator.interpolate(&self.passphrase)).filter(|p| !p.is_empty());

		match self.kind {
			ClientCertKind::Cert => Ok(ClientIdentity::Pem {
				cert: read_material(collection_path, &interpolator.interpolate(&self.cert_file_path))?,
				key: read_material(collection_path, &interpolator.interpolate(&self.key_file_path))?,
				passphrase,
			}),
			ClientCertKind::Pfx => Ok(ClientIdentity::Pfx {
				archive: read_material(
					collection_path,
					&interpolator.interpolate(&self.pfx_file_path),
				)?,
				passphrase,
			}),
		}
	}
}

/// Client identity loaded from disk.
#[derive(Clone, PartialEq, Eq)]
pub enum ClientIdentity {
	/// PEM certificate chain plus private key.
	Pem {
		/// Certificate bytes.
		cert: Vec<u8>,
		/// Private key bytes.
		key: Vec<u8>,
		/// Key passphrase.
		passphrase: Option<String>,
	},
	/// PKCS#12 archive.
	Pfx {
		/// Archive bytes.
		archive: Vec<u8>,
		/// Archive passphrase.
		passphrase: Option<String>,
	},
}
impl ClientIdentity {
	/// Label used in diagnostics.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Pem { .. } => "pem",
			Self::Pfx { .. } => "pfx",
		}
	}

	/// Unencrypted PKCS#8 key followed by the certificate chain, all PEM.
	///
	/// Encrypted keys and PKCS#12 archives are opened with their passphrase; an absent
	/// passphrase opens archives sealed with an empty one.
	pub fn pem_bundle(&self) -> Result<Vec<u8>, ConfigError> {
		let kind = self.kind();
		let invalid = |source: ErrorStack| ConfigError::InvalidIdentity { kind, source };

		match self {
			Self::Pem { cert, key, passphrase: None } => Ok(join_pem(key.clone(), [cert.as_slice()])),
			Self::Pem { cert, key, passphrase: Some(passphrase) } => {
				let key = PKey::private_key_from_pem_passphrase(key, passphrase.as_bytes())
					.and_then(|key| key.private_key_to_pem_pkcs8())
					.map_err(invalid)?;

				Ok(join_pem(key, [cert.as_slice()]))
			},
			Self::Pfx { archive, passphrase } => {
				let parsed = Pkcs12::from_der(archive)
					.and_then(|pkcs12| pkcs12.parse2(passphrase.as_deref().unwrap_or_default()))
					.map_err(invalid)?;
				let key = parsed
					.pkey
					.ok_or(ConfigError::IncompleteIdentity { kind, missing: "private key" })?
					.private_key_to_pem_pkcs8()
					.map_err(invalid)?;
				let mut chain = vec![
					parsed
						.cert
						.ok_or(ConfigError::IncompleteIdentity { kind, missing: "certificate" })?
						.to_pem()
						.map_err(invalid)?,
				];

				if let Some(authorities) = parsed.ca {
					for authority in authorities.iter() {
						chain.push(authority.to_pem().map_err(invalid)?);
					}
				}

				Ok(join_pem(key, chain.iter().map(Vec::as_slice)))
			},
		}
	}
}
impl Debug for ClientIdentity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientIdentity").field("kind", &self.kind()).finish_non_exhaustive()
	}
}

/// Picks the first rule whose domain pattern matches `url`.
pub fn match_client_certificate<'a>(
	certificates: &'a ClientCertificates,
	url: &str,
	interpolator: &Interpolator,
) -> Option<&'a ClientCertRule> {
	certificates.certs.iter().find(|rule| rule.matches(url, interpolator))
}

/// Joins a relative path onto `base`; absolute paths are kept.
pub fn resolve_path(base: &Path, path: &str) -> PathBuf {
	let path = Path::new(path);

	if path.is_absolute() { path.to_path_buf() } else { base.join(path) }
}

fn join_pem<'a>(mut out: Vec<u8>, blocks: impl IntoIterator<Item = &'a [u8]>) -> Vec<u8> {
	for block in blocks {
		if !out.is_empty() && !out.ends_with(b"\n") {
			out.push(b'\n');
		}

		out.extend_from_slice(block);
	}

	out
}

/// Reads certificate material, failing with [`Error::Certificate`].
pub fn read_material(base: &Path, path: &str) -> Result<Vec<u8>> {
	let path = resolve_path(base, path);

	std::fs::read(&path).map_err(|source| Error::Certificate { path, source })
}
