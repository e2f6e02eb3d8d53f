//! Script isolation and flow-dependent sequencing.
//!
//! Every non-blank segment is wrapped in its own async closure so a `return` or a local
//! binding in one segment cannot reach another. Pre-request segments always run collection →
//! folders → request. Post-response segments and tests follow the collection's
//! [`ScriptFlow`]: `sequential` keeps that order, `sandwich` reverses it.

// self
use crate::{
	_prelude::*,
	auth::ItemUid,
	tree::{Folder, RequestBlock, RootBlock, ScriptFlow},
};

/// Tree level a script segment came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptSource {
	/// Collection root.
	Collection,
	/// Folder root.
	Folder(ItemUid),
	/// The request itself.
	Request,
}

/// Line range of one segment inside the joined code (1-based, inclusive).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentLines {
	/// Origin of the segment.
	pub source: ScriptSource,
	/// First line.
	pub start_line: usize,
	/// Last line.
	pub end_line: usize,
}

/// Joined script plus line metadata for mapping runtime errors back to their source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptBundle {
	/// Wrapped segments joined by a blank line.
	pub code: String,
	/// Line range of the request segment; `(0, 0)` when only ancestors contributed.
	pub request_lines: Option<(usize, usize)>,
	/// Line range of every contributing segment.
	pub segments: Vec<SegmentLines>,
}
impl ScriptBundle {
	/// Wraps and joins `(source, text)` pairs in the given order.
	pub fn build<'a>(parts: impl IntoIterator<Item = (ScriptSource, Option<&'a str>)>) -> Self {
		let mut bundle = Self::default();
		let mut wrapped_parts = Vec::new();
		let mut offset = 0;

		for (source, text) in parts {
			let Some(wrapped) = text.and_then(wrap_in_closure) else {
				continue;
			};
			let line_count = wrapped.split('\n').count();
			let (start_line, end_line) = (offset + 1, offset + line_count);

			if source == ScriptSource::Request {
				bundle.request_lines = Some((start_line, end_line));
			}

			bundle.segments.push(SegmentLines { source, start_line, end_line });
			wrapped_parts.push(wrapped);

			offset += line_count + 1;
		}

		bundle.code = wrapped_parts.join("\n\n");

		if bundle.request_lines.is_none() && !bundle.code.is_empty() {
			bundle.request_lines = Some((0, 0));
		}

		bundle
	}

	/// Returns `true` when no segment contributed code.
	pub fn is_empty(&self) -> bool {
		self.code.is_empty()
	}
}

/// Merged script bundles for one request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergedScripts {
	/// Pre-request script.
	pub pre_request: ScriptBundle,
	/// Post-response script.
	pub post_response: ScriptBundle,
	/// Tests.
	pub tests: ScriptBundle,
}

/// Wraps one script in an isolating async closure; blank scripts yield `None`.
pub fn wrap_in_closure(script: &str) -> Option<String> {
	if script.trim().is_empty() {
		return None;
	}

	Some(format!("await (async () => {{\n{script}\n}})();"))
}

/// Merges pre-request, post-response, and test scripts along the path.
pub fn merge_scripts(
	collection: Option<&RootBlock>,
	folders: &[&Folder],
	request: &RequestBlock,
	flow: ScriptFlow,
) -> MergedScripts {
	let empty = RootBlock::default();
	let collection = collection.unwrap_or(&empty);
	let folder_roots: Vec<(ScriptSource, &RootBlock)> = folders
		.iter()
		.filter_map(|folder| {
			folder.effective_root().map(|root| (ScriptSource::Folder(folder.uid.clone()), root))
		})
		.collect();
	let pre_request =
		outward_in(collection, &folder_roots, pick_pre_request, request.script.req.as_deref());
	let mut post_response =
		outward_in(collection, &folder_roots, pick_post_response, request.script.res.as_deref());
	let mut tests = outward_in(collection, &folder_roots, pick_tests, request.tests.as_deref());

	if flow == ScriptFlow::Sandwich {
		post_response.reverse();
		tests.reverse();
	}

	MergedScripts {
		pre_request: ScriptBundle::build(pre_request),
		post_response: ScriptBundle::build(post_response),
		tests: ScriptBundle::build(tests),
	}
}

type Pick = fn(&RootBlock) -> Option<&str>;

fn outward_in<'a>(
	collection: &'a RootBlock,
	folders: &[(ScriptSource, &'a RootBlock)],
	pick: Pick,
	leaf: Option<&'a str>,
) -> Vec<(ScriptSource, Option<&'a str>)> {
	let mut parts = vec![(ScriptSource::Collection, pick(collection))];

	parts.extend(folders.iter().map(|(source, root)| (source.clone(), pick(root))));
	parts.push((ScriptSource::Request, leaf));

	parts
}

fn pick_pre_request(root: &RootBlock) -> Option<&str> {
	root.script.req.as_deref()
}

fn pick_post_response(root: &RootBlock) -> Option<&str> {
	root.script.res.as_deref()
}

fn pick_tests(root: &RootBlock) -> Option<&str> {
	root.tests.as_deref()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::tree::Scripts;

	fn root_with_res(script: &str) -> RootBlock {
		RootBlock {
			script: Scripts { req: Some(format!("pre {script}")), res: Some(script.into()) },
			tests: Some(format!("test {script}")),
			..Default::default()
		}
	}

	fn fixture() -> (RootBlock, Folder, RequestBlock) {
		let folder = Folder::new(ItemUid::new("f").expect("Folder uid fixture should be valid."), "F")
			.with_root(root_with_res("B"));
		let mut request = RequestBlock::default();

		request.script = Scripts { req: Some("pre C".into()), res: Some("C".into()) };
		request.tests = Some("test C".into());

		(root_with_res("A"), folder, request)
	}

	fn wrapped(parts: &[&str]) -> String {
		parts
			.iter()
			.map(|p| wrap_in_closure(p).expect("Fixture scripts are not blank."))
			.collect::<Vec<_>>()
			.join("\n\n")
	}

	#[test]
	fn sandwich_reverses_post_response_and_tests() {
		let (collection, folder, request) = fixture();
		let merged = merge_scripts(Some(&collection), &[&folder], &request, ScriptFlow::Sandwich);

		assert_eq!(merged.pre_request.code, wrapped(&["pre A", "pre B", "pre C"]));
		assert_eq!(merged.post_response.code, wrapped(&["C", "B", "A"]));
		assert_eq!(merged.tests.code, wrapped(&["test C", "test B", "test A"]));
	}

	#[test]
	fn sequential_keeps_outward_in_order() {
		let (collection, folder, request) = fixture();
		let merged = merge_scripts(Some(&collection), &[&folder], &request, ScriptFlow::Sequential);

		assert_eq!(merged.post_response.code, wrapped(&["A", "B", "C"]));
	}

	#[test]
	fn blank_scripts_are_skipped() {
		assert_eq!(wrap_in_closure("  \n "), None);
		assert_eq!(wrap_in_closure("return 1;").as_deref(), Some("await (async () => {\nreturn 1;\n})();"));

		let bundle = ScriptBundle::build([
			(ScriptSource::Collection, Some("")),
			(ScriptSource::Request, None),
		]);

		assert!(bundle.is_empty());
		assert_eq!(bundle.request_lines, None);
	}

	#[test]
	fn request_line_metadata_tracks_offsets() {
		let bundle = ScriptBundle::build([
			(ScriptSource::Collection, Some("a();\nb();")),
			(ScriptSource::Request, Some("c();")),
		]);

		// Collection segment spans 4 lines, then one blank separator line.
		assert_eq!(bundle.segments[0].start_line, 1);
		assert_eq!(bundle.segments[0].end_line, 4);
		assert_eq!(bundle.request_lines, Some((6, 8)));

		let ancestors_only =
			ScriptBundle::build([(ScriptSource::Collection, Some("a();")), (ScriptSource::Request, None)]);

		assert_eq!(ancestors_only.request_lines, Some((0, 0)));
	}
}
