//! Folder and request nodes plus the blocks they carry.

// self
use crate::{
	_prelude::*,
	auth::{AuthConfig, ItemUid},
};

/// Node of a collection tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Item {
	/// Folder owning child items.
	Folder(Folder),
	/// Leaf request.
	#[serde(
		rename = "http-request",
		alias = "graphql-request",
		alias = "grpc-request",
		alias = "ws-request"
	)]
	Request(RequestItem),
}
impl Item {
	/// Identifier of the node.
	pub fn uid(&self) -> &ItemUid {
		match self {
			Self::Folder(folder) => &folder.uid,
			Self::Request(request) => &request.uid,
		}
	}

	/// Returns the folder when the node is one.
	pub fn as_folder(&self) -> Option<&Folder> {
		match self {
			Self::Folder(folder) => Some(folder),
			Self::Request(_) => None,
		}
	}

	/// Returns the request when the node is one.
	pub fn as_request(&self) -> Option<&RequestItem> {
		match self {
			Self::Request(request) => Some(request),
			Self::Folder(_) => None,
		}
	}
}

/// Folder node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Folder {
	/// Identifier.
	pub uid: ItemUid,
	/// Display name.
	#[serde(default)]
	pub name: String,
	/// Saved folder-level defaults.
	#[serde(default)]
	pub root: Option<RootBlock>,
	/// Unsaved folder-level defaults; supersede `root` when present.
	#[serde(default)]
	pub draft: Option<RootBlock>,
	/// Children in display order.
	#[serde(default)]
	pub items: Vec<Item>,
}
impl Folder {
	/// Creates an empty folder.
	pub fn new(uid: ItemUid, name: impl Into<String>) -> Self {
		Self { uid, name: name.into(), root: None, draft: None, items: Vec::new() }
	}

	/// Sets the saved root block.
	pub fn with_root(mut self, root: RootBlock) -> Self {
		self.root = Some(root);

		self
	}

	/// Appends a child item.
	pub fn with_item(mut self, item: Item) -> Self {
		self.items.push(item);

		self
	}

	/// Draft root when present, otherwise the saved root.
	pub fn effective_root(&self) -> Option<&RootBlock> {
		self.draft.as_ref().or(self.root.as_ref())
	}
}

/// Leaf request node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestItem {
	/// Identifier.
	pub uid: ItemUid,
	/// Display name.
	#[serde(default)]
	pub name: String,
	/// Saved request.
	pub request: RequestBlock,
	/// Unsaved edits; supersede `request` when present.
	#[serde(default)]
	pub draft: Option<RequestBlock>,
}
impl RequestItem {
	/// Creates a request node without a draft.
	pub fn new(uid: ItemUid, name: impl Into<String>, request: RequestBlock) -> Self {
		Self { uid, name: name.into(), request, draft: None }
	}

	/// Draft when present, otherwise the saved request.
	pub fn effective(&self) -> &RequestBlock {
		self.draft.as_ref().unwrap_or(&self.request)
	}
}

/// Defaults a collection or folder applies to every request below it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootBlock {
	/// Headers.
	pub headers: Vec<KeyValue>,
	/// Variables.
	pub vars: VarLists,
	/// Scripts.
	pub script: Scripts,
	/// Test script.
	pub tests: Option<String>,
	/// Auth; absent means the node does not configure auth.
	pub auth: Option<AuthConfig>,
}

/// Request definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestBlock {
	/// HTTP method.
	pub method: String,
	/// URL template.
	pub url: String,
	/// Query and path parameters.
	pub params: Vec<Param>,
	/// Headers.
	pub headers: Vec<KeyValue>,
	/// Body.
	pub body: Body,
	/// Variables.
	pub vars: VarLists,
	/// Scripts.
	pub script: Scripts,
	/// Test script.
	pub tests: Option<String>,
	/// Auth.
	pub auth: AuthConfig,
}
impl Default for RequestBlock {
	fn default() -> Self {
		Self {
			method: "GET".into(),
			url: String::new(),
			params: Vec::new(),
			headers: Vec::new(),
			body: Body::None,
			vars: VarLists::default(),
			script: Scripts::default(),
			tests: None,
			auth: AuthConfig::None,
		}
	}
}
impl RequestBlock {
	/// Creates a request with the given method and URL.
	pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
		Self { method: method.into(), url: url.into(), ..Default::default() }
	}

	/// Appends a header.
	pub fn with_header(mut self, header: KeyValue) -> Self {
		self.headers.push(header);

		self
	}

	/// Sets the auth block.
	pub fn with_auth(mut self, auth: AuthConfig) -> Self {
		self.auth = auth;

		self
	}

	/// Sets the body.
	pub fn with_body(mut self, body: Body) -> Self {
		self.body = body;

		self
	}

	/// Appends a parameter.
	pub fn with_param(mut self, param: Param) -> Self {
		self.params.push(param);

		self
	}
}

/// Name/value entry that can be switched off.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
	/// Name.
	pub name: String,
	/// Value (may contain placeholders).
	#[serde(default)]
	pub value: String,
	/// Disabled entries never take part in a merge.
	#[serde(default = "enabled_by_default")]
	pub enabled: bool,
}
impl KeyValue {
	/// Creates an enabled entry.
	pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self { name: name.into(), value: value.into(), enabled: true }
	}

	/// Creates a disabled entry.
	pub fn disabled(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self { enabled: false, ..Self::new(name, value) }
	}
}

/// Request-time (`req`) and response-time (`res`) variable lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VarLists {
	/// Evaluated before the request is sent.
	pub req: Vec<KeyValue>,
	/// Evaluated after the response arrives.
	pub res: Vec<KeyValue>,
}

/// Pre-request and post-response script text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scripts {
	/// Pre-request script.
	pub req: Option<String>,
	/// Post-response script.
	pub res: Option<String>,
}

/// Kind of request parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
	/// Query string parameter.
	#[default]
	Query,
	/// `:name` path segment.
	Path,
}

/// Query or path parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
	/// Name.
	pub name: String,
	/// Value.
	#[serde(default)]
	pub value: String,
	/// Kind.
	#[serde(default, rename = "type")]
	pub kind: ParamKind,
	/// Disabled parameters are ignored.
	#[serde(default = "enabled_by_default")]
	pub enabled: bool,
}
impl Param {
	/// Creates an enabled path parameter.
	pub fn path(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self { name: name.into(), value: value.into(), kind: ParamKind::Path, enabled: true }
	}

	/// Creates an enabled query parameter.
	pub fn query(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self { kind: ParamKind::Query, ..Self::path(name, value) }
	}
}

/// Request body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "content", rename_all = "camelCase")]
pub enum Body {
	/// No body.
	#[default]
	None,
	/// JSON text.
	Json(String),
	/// Plain text.
	Text(String),
	/// XML text.
	Xml(String),
	/// SPARQL text.
	Sparql(String),
	/// `application/x-www-form-urlencoded` fields.
	FormUrlEncoded(Vec<KeyValue>),
	/// `multipart/form-data` fields; file fields carry paths as values.
	MultipartForm(Vec<KeyValue>),
	/// GraphQL query plus variables text.
	Graphql(GraphqlBody),
	/// Structured payload such as a gRPC message.
	Structured(JsonValue),
}

/// GraphQL body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphqlBody {
	/// Query document.
	pub query: String,
	/// Variables as JSON text.
	pub variables: String,
}

fn enabled_by_default() -> bool {
	true
}
