//! Ordered header sets and the ancestor-to-leaf header merge.

// self
use crate::{
	_prelude::*,
	tree::{Folder, KeyValue, RequestBlock, RootBlock},
};

const CONTENT_TYPE: &str = "content-type";

/// Ordered header map.
///
/// Names match case-sensitively except `content-type`, which matches in any case. Replacing an
/// existing entry keeps its original position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSet(Vec<(String, String)>);
impl HeaderSet {
	/// Creates an empty set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts or replaces a header.
	pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();
		let value = value.into();

		match self.position(&name) {
			Some(idx) => self.0[idx] = (name, value),
			None => self.0.push((name, value)),
		}
	}

	/// Sets a header, dropping every entry whose name matches it ignoring ASCII case.
	///
	/// The header takes the position of the first entry it drops.
	pub fn set_ignore_case(&mut self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();
		let at = self.0.iter().position(|(n, _)| n.eq_ignore_ascii_case(&name));

		self.0.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));

		let entry = (name, value.into());

		match at {
			Some(idx) => self.0.insert(idx, entry),
			None => self.0.push(entry),
		}
	}

	/// Looks up a header value.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.position(name).map(|idx| self.0[idx].1.as_str())
	}

	/// Looks up a header value ignoring ASCII case.
	pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
		self.0.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
	}

	/// Removes a header, returning its value.
	pub fn remove(&mut self, name: &str) -> Option<String> {
		self.position(name).map(|idx| self.0.remove(idx).1)
	}

	/// Iterates headers in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
	}

	/// Number of headers.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no header is set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Rebuilds the set by transforming every name and value.
	pub fn map(&self, mut f: impl FnMut(&str) -> String) -> Self {
		let mut out = Self::new();

		for (name, value) in self.iter() {
			out.set(f(name), f(value));
		}

		out
	}

	fn position(&self, name: &str) -> Option<usize> {
		if name.eq_ignore_ascii_case(CONTENT_TYPE) {
			self.0.iter().position(|(n, _)| n.eq_ignore_ascii_case(CONTENT_TYPE))
		} else {
			self.0.iter().position(|(n, _)| n == name)
		}
	}
}
impl<N, V> FromIterator<(N, V)> for HeaderSet
where
	N: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
		let mut set = Self::new();

		for (name, value) in iter {
			set.set(name, value);
		}

		set
	}
}

/// Result of the header merge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergedHeaders {
	/// Winning headers, not yet interpolated.
	pub headers: HeaderSet,
	/// Whether any level explicitly set `content-type`.
	pub content_type_defined: bool,
}

/// Merges enabled headers collection → folders → request; later levels win.
pub fn merge_headers(
	collection: Option<&RootBlock>,
	folders: &[&Folder],
	request: &RequestBlock,
) -> MergedHeaders {
	let mut merged = MergedHeaders::default();
	let mut apply = |entries: &[KeyValue]| {
		for header in entries.iter().filter(|h| h.enabled) {
			if header.name.eq_ignore_ascii_case(CONTENT_TYPE) {
				merged.content_type_defined = true;
			}

			merged.headers.set(header.name.clone(), header.value.clone());
		}
	};

	if let Some(root) = collection {
		apply(&root.headers);
	}
	for root in folders.iter().filter_map(|folder| folder.effective_root()) {
		apply(&root.headers);
	}

	apply(&request.headers);

	merged
}
