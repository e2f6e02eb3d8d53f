//! Effective auth resolution for requests whose mode is `inherit`.

// self
use crate::{
	_prelude::*,
	auth::{AuthConfig, AuthMode, CollectionUid, ItemUid},
	tree::{Folder, RequestBlock, RootBlock},
};

/// Scope an inherited OAuth2 block came from.
///
/// Requests inheriting from the same folder share one cached credential; inheriting from the
/// collection shares it collection-wide.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2CredentialsRef {
	/// Owning collection.
	pub collection_uid: CollectionUid,
	/// Folder that supplied the auth, when it was a folder.
	pub folder_uid: Option<ItemUid>,
	/// Request that supplied the auth; always `None` for inherited auth.
	pub item_uid: Option<ItemUid>,
	/// Credentials identifier from the OAuth2 block.
	pub credentials_id: String,
}

/// Tree level that supplied the effective auth.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthSource {
	/// Collection root.
	Collection,
	/// Folder root.
	Folder(ItemUid),
	/// The request's own block.
	Request,
}

/// Effective auth for one request.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedAuth {
	/// Auth to apply; never [`AuthConfig::Inherit`].
	pub auth: AuthConfig,
	/// Level that supplied it.
	pub source: AuthSource,
	/// Credential scope when the auth was inherited and is OAuth2.
	pub credentials_ref: Option<OAuth2CredentialsRef>,
}

/// Resolves the request's effective auth.
///
/// Walking root to leaf, a folder replaces the inherited auth only when its mode is set and is
/// neither `none` nor `inherit`. A folder with `none` is skipped, so it does not reset what
/// its ancestors supplied.
pub fn resolve_auth(
	collection_uid: &CollectionUid,
	collection: Option<&RootBlock>,
	folders: &[&Folder],
	request: &RequestBlock,
) -> ResolvedAuth {
	if request.auth.mode() != AuthMode::Inherit {
		return ResolvedAuth {
			auth: request.auth.clone(),
			source: AuthSource::Request,
			credentials_ref: None,
		};
	}

	let mut effective = collection.and_then(|root| root.auth.clone()).unwrap_or_default();
	let mut last_folder_with_auth = None;

	if effective.mode() == AuthMode::Inherit {
		effective = AuthConfig::None;
	}

	for folder in folders {
		let Some(auth) = folder.effective_root().and_then(|root| root.auth.as_ref()) else {
			continue;
		};

		if matches!(auth.mode(), AuthMode::None | AuthMode::Inherit) {
			continue;
		}

		effective = auth.clone();
		last_folder_with_auth = Some(folder.uid.clone());
	}

	let credentials_ref = effective.as_oauth2().map(|config| OAuth2CredentialsRef {
		collection_uid: collection_uid.clone(),
		folder_uid: last_folder_with_auth.clone(),
		item_uid: None,
		credentials_id: config.credentials_id.clone(),
	});
	let source = match last_folder_with_auth {
		Some(uid) => AuthSource::Folder(uid),
		None => AuthSource::Collection,
	};

	ResolvedAuth { auth: effective, source, credentials_ref }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::{BasicAuth, BearerAuth, ClientCredentialsGrant, OAuth2Config, OAuth2Grant};

	fn collection_uid() -> CollectionUid {
		CollectionUid::new("col").expect("Collection uid fixture should be valid.")
	}

	fn folder(uid: &str, auth: Option<AuthConfig>) -> Folder {
		Folder::new(ItemUid::new(uid).expect("Folder uid fixture should be valid."), uid)
			.with_root(RootBlock { auth, ..Default::default() })
	}

	fn oauth2() -> AuthConfig {
		AuthConfig::OAuth2(OAuth2Config::new(OAuth2Grant::ClientCredentials(
			ClientCredentialsGrant {
				access_token_url: Some("https://idp.test/token".into()),
				..Default::default()
			},
		)))
	}

	fn basic() -> AuthConfig {
		AuthConfig::Basic(BasicAuth { username: "u".into(), password: "p".into() })
	}

	fn inherit() -> RequestBlock {
		RequestBlock::default().with_auth(AuthConfig::Inherit)
	}

	#[test]
	fn folder_oauth2_scopes_credentials_to_folder() {
		let collection = RootBlock { auth: Some(basic()), ..Default::default() };
		let f = folder("F", Some(oauth2()));
		let resolved = resolve_auth(&collection_uid(), Some(&collection), &[&f], &inherit());
		let credentials_ref = resolved.credentials_ref.expect("OAuth2 inheritance yields a ref.");

		assert_eq!(resolved.auth, oauth2());
		assert_eq!(resolved.source, AuthSource::Folder(f.uid.clone()));
		assert_eq!(credentials_ref.folder_uid, Some(f.uid.clone()));
		assert_eq!(credentials_ref.item_uid, None);
		assert_eq!(credentials_ref.credentials_id, "credentials");
	}

	#[test]
	fn collection_oauth2_scopes_credentials_to_collection() {
		let collection = RootBlock { auth: Some(oauth2()), ..Default::default() };
		let f = folder("F", None);
		let resolved = resolve_auth(&collection_uid(), Some(&collection), &[&f], &inherit());
		let credentials_ref = resolved.credentials_ref.expect("OAuth2 inheritance yields a ref.");

		assert_eq!(resolved.source, AuthSource::Collection);
		assert_eq!(credentials_ref.folder_uid, None);
		assert_eq!(credentials_ref.item_uid, None);
	}

	#[test]
	fn none_and_inherit_folders_are_skipped() {
		let collection = RootBlock { auth: Some(basic()), ..Default::default() };
		let outer = folder("outer", Some(AuthConfig::Bearer(BearerAuth { token: "t".into() })));
		let none = folder("none", Some(AuthConfig::None));
		let pass = folder("pass", Some(AuthConfig::Inherit));
		let resolved =
			resolve_auth(&collection_uid(), Some(&collection), &[&outer, &none, &pass], &inherit());

		assert_eq!(resolved.auth, AuthConfig::Bearer(BearerAuth { token: "t".into() }));
		assert_eq!(resolved.source, AuthSource::Folder(outer.uid.clone()));
	}

	#[test]
	fn own_auth_produces_no_ref() {
		let collection = RootBlock { auth: Some(basic()), ..Default::default() };
		let request = RequestBlock::default().with_auth(oauth2());
		let resolved = resolve_auth(&collection_uid(), Some(&collection), &[], &request);

		assert_eq!(resolved.source, AuthSource::Request);
		assert_eq!(resolved.auth, oauth2());
		assert!(resolved.credentials_ref.is_none());
	}

	#[test]
	fn missing_collection_auth_means_none() {
		let resolved = resolve_auth(&collection_uid(), None, &[], &inherit());

		assert_eq!(resolved.auth, AuthConfig::None);
		assert!(resolved.credentials_ref.is_none());
	}
}
