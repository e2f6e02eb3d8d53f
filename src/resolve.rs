//! Ancestor-to-leaf resolution of headers, variables, scripts, and auth.
//!
//! Everything here is synchronous and allocation-only; callers may run it on any thread.

pub mod auth;
pub mod headers;
pub mod scripts;
pub mod vars;

pub use auth::*;
pub use headers::*;
pub use scripts::*;
pub use vars::*;

// self
use crate::tree::{Body, Collection, Param, TreePath};

/// Request with every inherited value merged in, not yet interpolated.
#[derive(Clone, Debug, PartialEq)]
pub struct MergedRequest {
	/// HTTP method.
	pub method: String,
	/// URL template.
	pub url: String,
	/// Enabled query and path parameters.
	pub params: Vec<Param>,
	/// Body template.
	pub body: Body,
	/// Merged headers.
	pub headers: HeaderSet,
	/// Whether any level explicitly set `content-type`.
	pub content_type_defined: bool,
	/// Merged variable tiers.
	pub variables: MergedVariables,
	/// Merged scripts.
	pub scripts: MergedScripts,
}

/// Merges collection, folder, and request levels along `path`.
///
/// Drafts supersede saved content at every level.
pub fn merge(collection: &Collection, path: &TreePath<'_>) -> MergedRequest {
	let root = collection.effective_root();
	let request = path.request.effective();
	let MergedHeaders { headers, content_type_defined } =
		merge_headers(root, &path.folders, request);

	MergedRequest {
		method: request.method.clone(),
		url: request.url.clone(),
		params: request.params.iter().filter(|param| param.enabled).cloned().collect(),
		body: request.body.clone(),
		headers,
		content_type_defined,
		variables: merge_variables(root, &path.folders, request),
		scripts: merge_scripts(root, &path.folders, request, collection.settings.scripts.flow),
	}
}

/// Resolves the effective auth for the request at the end of `path`.
pub fn resolve_request_auth(collection: &Collection, path: &TreePath<'_>) -> ResolvedAuth {
	resolve_auth(
		&collection.uid,
		collection.effective_root(),
		&path.folders,
		path.request.effective(),
	)
}
