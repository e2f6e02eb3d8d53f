//! In-memory collection trees: collection root, folders, requests, and environments.

pub mod environment;
pub mod item;

pub use environment::*;
pub use item::*;

// self
use crate::{
	_prelude::*,
	auth::{CollectionUid, ItemUid},
	network::{ClientCertificates, CollectionProxy},
};

/// Loaded collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
	/// Identifier; keys OAuth2 credential storage.
	pub uid: CollectionUid,
	/// Directory the collection was loaded from; relative certificate paths resolve here.
	#[serde(default)]
	pub pathname: PathBuf,
	/// Saved collection-level defaults.
	#[serde(default)]
	pub root: Option<RootBlock>,
	/// Unsaved collection-level defaults; supersede `root` when present.
	#[serde(default)]
	pub draft_root: Option<RootBlock>,
	/// Collection settings.
	#[serde(default)]
	pub settings: CollectionSettings,
	/// Top-level items.
	#[serde(default)]
	pub items: Vec<Item>,
}
impl Collection {
	/// Creates an empty collection rooted at `pathname`.
	pub fn new(uid: CollectionUid, pathname: impl Into<PathBuf>) -> Self {
		Self {
			uid,
			pathname: pathname.into(),
			root: None,
			draft_root: None,
			settings: CollectionSettings::default(),
			items: Vec::new(),
		}
	}

	/// Sets the saved root block.
	pub fn with_root(mut self, root: RootBlock) -> Self {
		self.root = Some(root);

		self
	}

	/// Appends a top-level item.
	pub fn with_item(mut self, item: Item) -> Self {
		self.items.push(item);

		self
	}

	/// Replaces the settings.
	pub fn with_settings(mut self, settings: CollectionSettings) -> Self {
		self.settings = settings;

		self
	}

	/// Draft root when present, otherwise the saved root.
	pub fn effective_root(&self) -> Option<&RootBlock> {
		self.draft_root.as_ref().or(self.root.as_ref())
	}

	/// Finds a node anywhere in the tree.
	pub fn find(&self, uid: &str) -> Option<&Item> {
		find_in(&self.items, uid)
	}

	/// Path from the outermost folder down to the request `uid`.
	///
	/// Returns `None` when `uid` is missing or names a folder.
	pub fn tree_path(&self, uid: &str) -> Option<TreePath<'_>> {
		let mut stack = Vec::new();

		if !collect_path(&self.items, uid, &mut stack) {
			return None;
		}

		let request = stack.pop()?.as_request()?;
		let folders = stack.into_iter().filter_map(Item::as_folder).collect();

		Some(TreePath { folders, request })
	}
}

/// Root-to-leaf path to a request, excluding the collection itself.
#[derive(Clone, Debug)]
pub struct TreePath<'a> {
	/// Ancestor folders, outermost first.
	pub folders: Vec<&'a Folder>,
	/// Leaf request.
	pub request: &'a RequestItem,
}
impl<'a> TreePath<'a> {
	/// Builds a path from explicit parts.
	pub fn new(folders: Vec<&'a Folder>, request: &'a RequestItem) -> Self {
		Self { folders, request }
	}

	/// Identifier of the leaf request.
	pub fn request_uid(&self) -> &'a ItemUid {
		&self.request.uid
	}
}

/// Collection-level settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollectionSettings {
	/// Script settings.
	pub scripts: ScriptSettings,
	/// Proxy override.
	pub proxy: CollectionProxy,
	/// Client certificate rules.
	pub client_certificates: ClientCertificates,
}

/// Script settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
	/// Ordering of post-response scripts and tests.
	pub flow: ScriptFlow,
}

/// Ordering of post-response scripts and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", rename_all = "lowercase")]
pub enum ScriptFlow {
	/// Request first, collection last.
	#[default]
	Sandwich,
	/// Collection first, request last.
	Sequential,
}
impl From<Option<String>> for ScriptFlow {
	fn from(value: Option<String>) -> Self {
		match value.as_deref() {
			Some("sequential") => Self::Sequential,
			_ => Self::Sandwich,
		}
	}
}

fn find_in<'a>(items: &'a [Item], uid: &str) -> Option<&'a Item> {
	for item in items {
		if item.uid().as_ref() == uid {
			return Some(item);
		}
		if let Item::Folder(folder) = item {
			if let Some(found) = find_in(&folder.items, uid) {
				return Some(found);
			}
		}
	}

	None
}

fn collect_path<'a>(items: &'a [Item], uid: &str, stack: &mut Vec<&'a Item>) -> bool {
	for item in items {
		stack.push(item);

		if item.uid().as_ref() == uid {
			return true;
		}
		if let Item::Folder(folder) = item {
			if collect_path(&folder.items, uid, stack) {
				return true;
			}
		}

		stack.pop();
	}

	false
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn uid(value: &str) -> ItemUid {
		ItemUid::new(value).expect("Item uid fixture should be valid.")
	}

	fn fixture() -> Collection {
		let request = RequestItem::new(uid("req"), "Get user", RequestBlock::new("GET", "/u"));
		let inner = Folder::new(uid("inner"), "Inner").with_item(Item::Request(request));
		let outer = Folder::new(uid("outer"), "Outer").with_item(Item::Folder(inner));

		Collection::new(
			CollectionUid::new("col").expect("Collection uid fixture should be valid."),
			"/tmp/col",
		)
		.with_item(Item::Folder(outer))
		.with_item(Item::Request(RequestItem::new(uid("top"), "Top", RequestBlock::default())))
	}

	#[test]
	fn tree_path_lists_folders_outermost_first() {
		let collection = fixture();
		let path = collection.tree_path("req").expect("Nested request should be found.");
		let names: Vec<_> = path.folders.iter().map(|folder| folder.name.as_str()).collect();

		assert_eq!(names, ["Outer", "Inner"]);
		assert_eq!(path.request_uid().as_ref(), "req");

		let top = collection.tree_path("top").expect("Top-level request should be found.");

		assert!(top.folders.is_empty());
	}

	#[test]
	fn tree_path_rejects_folders_and_unknown_ids() {
		let collection = fixture();

		assert!(collection.tree_path("inner").is_none());
		assert!(collection.tree_path("missing").is_none());
		assert!(collection.find("inner").is_some());
	}

	#[test]
	fn drafts_supersede_saved_content() {
		let mut request = RequestItem::new(uid("r"), "R", RequestBlock::new("GET", "/saved"));

		assert_eq!(request.effective().url, "/saved");

		request.draft = Some(RequestBlock::new("POST", "/draft"));

		assert_eq!(request.effective().url, "/draft");
	}

	#[test]
	fn unknown_script_flow_means_sandwich() {
		let settings: CollectionSettings =
			serde_json::from_str(r#"{"scripts":{"flow":"whatever"}}"#)
				.expect("Settings fixture should deserialize.");

		assert_eq!(settings.scripts.flow, ScriptFlow::Sandwich);
	}

	#[test]
	fn null_script_flow_means_sandwich() {
		let settings: CollectionSettings = serde_json::from_str(r#"{"scripts":{"flow":null}}"#)
			.expect("A null flow should deserialize.");
		let sequential: CollectionSettings =
			serde_json::from_str(r#"{"scripts":{"flow":"sequential"}}"#)
				.expect("Settings fixture should deserialize.");

		assert_eq!(settings.scripts.flow, ScriptFlow::Sandwich);
		assert_eq!(sequential.scripts.flow, ScriptFlow::Sequential);
	}
}
