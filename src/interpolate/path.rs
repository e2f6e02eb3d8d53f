//! `:name` path-parameter substitution.

// std
use std::sync::LazyLock;
// crates.io
use regex::{Captures, Regex};
// self
use crate::tree::{Param, ParamKind};

static ODATA_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[A-Za-z0-9_.\-]+\([^)]*\)$").expect("OData segment pattern is valid.")
});
static ODATA_TOKEN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r":(\w+)").expect("OData token pattern is valid."));

/// Replaces `:name` path segments with the matching enabled path parameter.
///
/// Works on the raw text: the origin, the query string and the fragment are copied byte for byte.
/// Segments naming an unknown parameter are kept as written. OData-style segments such as
/// `Users(':id')` substitute each embedded `:name` token.
pub fn apply_path_params(url: &str, params: &[Param]) -> String {
	let path_params: Vec<&Param> =
		params.iter().filter(|param| param.enabled && param.kind == ParamKind::Path).collect();

	if path_params.is_empty() {
		return url.to_owned();
	}

	let lookup = |name: &str| {
		path_params.iter().find(|param| param.name == name).map(|param| param.value.as_str())
	};
	let (head, tail) = split_tail(url);
	let (origin, path) = split_origin(head);
	let path = path
		.split('/')
		.map(|segment| {
			if ODATA_SEGMENT.is_match(segment) {
				return ODATA_TOKEN
					.replace_all(segment, |caps: &Captures| {
						lookup(&caps[1]).map(str::to_owned).unwrap_or_else(|| caps[0].to_owned())
					})
					.into_owned();
			}

			match segment.strip_prefix(':').and_then(lookup) {
				Some(value) => value.to_owned(),
				None => segment.to_owned(),
			}
		})
		.collect::<Vec<_>>()
		.join("/");

	format!("{origin}{path}{tail}")
}

fn split_tail(url: &str) -> (&str, &str) {
	match url.find(['?', '#']) {
		Some(idx) => url.split_at(idx),
		None => (url, ""),
	}
}

fn split_origin(head: &str) -> (&str, &str) {
	let Some(scheme_end) = head.find("://") else {
		return ("", head);
	};
	let authority_start = scheme_end + 3;

	match head[authority_start..].find('/') {
		Some(idx) => head.split_at(authority_start + idx),
		None => (head, ""),
	}
}
