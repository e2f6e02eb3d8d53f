//! End-to-end preparation of one request for the transport.
//!
//! [`RequestPreparer::prepare`] runs, in order: tree path lookup, the ancestor merge, effective
//! auth resolution, auth interpolation, OAuth2 credential resolution, interpolation of URL,
//! headers, parameters and body, path parameter substitution, auth injection, and finally TLS and
//! proxy resolution for the final URL.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::{
	_prelude::*,
	auth::{ApiKeyPlacement, AuthConfig, OAuth2Config, TokenPlacement},
	flows::{CredentialsOutcome, CredentialsRequest, OAuth2Engine},
	http::TokenHttpClient,
	interpolate::{
		Interpolator, VariableLayers, VariableMap, apply_path_params, interpolate_body,
		interpolate_headers,
	},
	network::{NetworkResolver, SystemProxy, TransportSettings},
	preferences::Preferences,
	resolve::{
		AuthSource, HeaderSet, MergedScripts, MergedVariables, OAuth2CredentialsRef, merge,
		resolve_request_auth,
	},
	tree::{Body, Collection, Environment, KeyValue, Param, ParamKind},
};

const AUTHORIZATION: &str = "Authorization";

/// Everything needed to prepare one request.
pub struct PrepareContext<'a> {
	/// Loaded collection.
	pub collection: &'a Collection,
	/// Request to prepare.
	pub item_uid: &'a str,
	/// Read-only application preferences.
	pub preferences: &'a dyn Preferences,
	/// Selected environment.
	pub environment: Option<&'a Environment>,
	/// Global environment.
	pub global_environment: Option<&'a Environment>,
	/// Variables set by scripts.
	pub runtime: VariableMap,
	/// Values typed into prompts.
	pub prompt: VariableMap,
	/// Process environment for `{{process.env.NAME}}`.
	pub process_env: VariableMap,
	/// Fixed system proxy; probed from the environment when absent.
	pub system_proxy: Option<SystemProxy>,
	/// Discard stored OAuth2 credentials and acquire new ones.
	pub force_oauth2_fetch: bool,
}
impl<'a> PrepareContext<'a> {
	/// Creates a context with empty variable layers.
	pub fn new(
		collection: &'a Collection,
		item_uid: &'a str,
		preferences: &'a dyn Preferences,
	) -> Self {
		Self {
			collection,
			item_uid,
			preferences,
			environment: None,
			global_environment: None,
			runtime: VariableMap::new(),
			prompt: VariableMap::new(),
			process_env: VariableMap::new(),
			system_proxy: None,
			force_oauth2_fetch: false,
		}
	}

	/// Selects an environment.
	pub fn with_environment(mut self, environment: &'a Environment) -> Self {
		self.environment = Some(environment);

		self
	}

	/// Sets the global environment.
	pub fn with_global_environment(mut self, environment: &'a Environment) -> Self {
		self.global_environment = Some(environment);

		self
	}

	/// Sets runtime variables.
	pub fn with_runtime(mut self, vars: VariableMap) -> Self {
		self.runtime = vars;

		self
	}

	/// Sets prompt values.
	pub fn with_prompt(mut self, vars: VariableMap) -> Self {
		self.prompt = vars;

		self
	}

	/// Sets the process environment.
	pub fn with_process_env(mut self, vars: VariableMap) -> Self {
		self.process_env = vars;

		self
	}

	/// Uses a fixed system proxy.
	pub fn with_system_proxy(mut self, system_proxy: SystemProxy) -> Self {
		self.system_proxy = Some(system_proxy);

		self
	}

	/// Forces a new OAuth2 acquisition.
	pub fn force_oauth2_fetch(mut self) -> Self {
		self.force_oauth2_fetch = true;

		self
	}

	fn layers(&self, variables: &MergedVariables) -> VariableLayers {
		VariableLayers::new()
			.with_global_environment(
				self.global_environment.map(Environment::to_map).unwrap_or_default(),
			)
			.with_collection(variables.collection.clone())
			.with_environment(self.environment.map(Environment::to_map).unwrap_or_default())
			.with_folder(variables.folder.clone())
			.with_request(variables.request.clone())
			.with_runtime(self.runtime.clone())
			.with_prompt(self.prompt.clone())
			.with_process_env(self.process_env.clone())
	}

	fn network<'r>(&'r self, interpolator: &'r Interpolator) -> NetworkResolver<'r> {
		let resolver = NetworkResolver::new(self.collection, self.preferences, interpolator);

		match &self.system_proxy {
			Some(system_proxy) => resolver.with_system_proxy(system_proxy.clone()),
			None => resolver,
		}
	}
}

/// Request ready for the transport.
#[derive(Clone, Debug)]
pub struct PreparedRequest {
	/// HTTP method.
	pub method: String,
	/// Interpolated URL with path parameters and URL-placed credentials applied.
	pub url: String,
	/// Interpolated headers including injected auth.
	pub headers: HeaderSet,
	/// Interpolated query and path parameters.
	pub params: Vec<Param>,
	/// Interpolated body.
	pub body: Body,
	/// Interpolated effective auth; transport-handled modes are applied by the caller.
	pub auth: AuthConfig,
	/// Tree level that supplied `auth`.
	pub auth_source: AuthSource,
	/// Credential scope of inherited OAuth2 auth.
	pub credentials_ref: Option<OAuth2CredentialsRef>,
	/// OAuth2 credential resolution, including its debug trail.
	pub oauth2: Option<CredentialsOutcome>,
	/// TLS and proxy settings for `url`.
	pub transport: TransportSettings,
	/// Merged scripts.
	pub scripts: MergedScripts,
	/// Merged post-response variable assignments.
	pub response_vars: Vec<KeyValue>,
	/// Whether any level set `content-type` explicitly.
	pub content_type_defined: bool,
}

/// Prepares requests, acquiring OAuth2 credentials through an [`OAuth2Engine`].
#[derive(Clone, Debug)]
pub struct RequestPreparer<C>
where
	C: ?Sized + TokenHttpClient,
{
	engine: OAuth2Engine<C>,
}
impl<C> RequestPreparer<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a preparer around `engine`.
	pub fn new(engine: OAuth2Engine<C>) -> Self {
		Self { engine }
	}

	/// Credential engine in use.
	pub fn engine(&self) -> &OAuth2Engine<C> {
		&self.engine
	}

	/// Prepares the request named by `ctx.item_uid`.
	///
	/// OAuth2 validation failures and provider rejections do not fail preparation; they are
	/// reported in [`PreparedRequest::oauth2`] and no token is injected.
	pub async fn prepare(&self, ctx: PrepareContext<'_>) -> Result<PreparedRequest> {
		let collection = ctx.collection;
		let path = collection.tree_path(ctx.item_uid).ok_or_else(|| Error::ItemNotFound {
			collection: collection.uid.to_string(),
			uid: ctx.item_uid.to_owned(),
		})?;
		let merged = merge(collection, &path);
		let resolved = resolve_request_auth(collection, &path);
		let mut layers = ctx.layers(&merged.variables);
		let auth = Interpolator::new(&layers).interpolate_typed(&resolved.auth);
		let oauth2 = match &auth {
			AuthConfig::OAuth2(config) => Some(self.oauth2(&ctx, &layers, config).await?),
			_ => None,
		};

		if let Some(outcome) = &oauth2 {
			if let Some(credentials) = &outcome.credentials {
				let vars = credentials.variables(&outcome.credentials_id).into_iter().collect();

				layers = layers.with_oauth2_credentials(vars);
			}
		}

		let interpolator = Interpolator::new(&layers);
		let mut headers = interpolate_headers(&merged.headers, &interpolator);
		let params: Vec<Param> = merged
			.params
			.iter()
			.map(|param| Param {
				name: interpolator.interpolate(&param.name),
				value: interpolator.interpolate(&param.value),
				..param.clone()
			})
			.collect();
		let path_params: Vec<Param> =
			params.iter().filter(|param| param.kind == ParamKind::Path).cloned().collect();
		let mut url = apply_path_params(&interpolator.interpolate(&merged.url), &path_params);
		let body = interpolate_body(&merged.body, &interpolator);

		apply_auth(&auth, oauth2.as_ref(), &mut headers, &mut url);

		let transport = ctx.network(&interpolator).resolve(&url)?;

		Ok(PreparedRequest {
			method: merged.method,
			url,
			headers,
			params,
			body,
			auth,
			auth_source: resolved.source,
			credentials_ref: resolved.credentials_ref,
			oauth2,
			transport,
			scripts: merged.scripts,
			response_vars: merged.variables.response,
			content_type_defined: merged.content_type_defined,
		})
	}

	async fn oauth2(
		&self,
		ctx: &PrepareContext<'_>,
		layers: &VariableLayers,
		config: &OAuth2Config,
	) -> Result<CredentialsOutcome> {
		let transport = {
			let interpolator = Interpolator::new(layers);

			ctx.network(&interpolator).resolve(config.store_url())?
		};
		let mut request = CredentialsRequest::new(ctx.collection.uid.clone(), config.clone())
			.with_transport(transport);

		request.force = ctx.force_oauth2_fetch;

		self.engine.credentials(request).await
	}
}

/// Injects credentials for the auth modes handled here.
///
/// Digest, AWS Signature V4 and WSSE need the final request bytes or a server challenge, so they
/// are left to the transport.
pub fn apply_auth(
	auth: &AuthConfig,
	oauth2: Option<&CredentialsOutcome>,
	headers: &mut HeaderSet,
	url: &mut String,
) {
	match auth {
		AuthConfig::Basic(basic) => {
			let pair = format!("{}:{}", basic.username, basic.password);

			headers.set_ignore_case(AUTHORIZATION, format!("Basic {}", STANDARD.encode(pair)));
		},
		AuthConfig::Bearer(bearer) =>
			headers.set_ignore_case(AUTHORIZATION, format!("Bearer {}", bearer.token)),
		AuthConfig::ApiKey(api_key) if !api_key.key.is_empty() => match api_key.placement {
			ApiKeyPlacement::Header =>
				headers.set_ignore_case(api_key.key.clone(), api_key.value.clone()),
			ApiKeyPlacement::QueryParams => *url = append_query(url, &api_key.key, &api_key.value),
		},
		AuthConfig::OAuth2(config) => {
			let Some(token) = oauth2.and_then(CredentialsOutcome::access_token) else {
				return;
			};

			match config.token_placement {
				TokenPlacement::Header => {
					let prefix = config.token_header_prefix.trim();
					let value =
						if prefix.is_empty() { token.to_owned() } else { format!("{prefix} {token}") };

					headers.set_ignore_case(AUTHORIZATION, value);
				},
				TokenPlacement::Url => *url = append_query(url, &config.token_query_key, token),
			}
		},
		_ => {},
	}
}

/// Appends an encoded `name=value` pair to the query of `url`, before any fragment.
pub fn append_query(url: &str, name: &str, value: &str) -> String {
	let pair = url::form_urlencoded::Serializer::new(String::new()).append_pair(name, value).finish();
	let (base, fragment) = match url.split_once('#') {
		Some((base, fragment)) => (base, Some(fragment)),
		None => (url, None),
	};
	let separator = match base.find('?') {
		None => "?",
		Some(_) if base.ends_with('?') || base.ends_with('&') => "",
		Some(_) => "&",
	};
	let mut out = format!("{base}{separator}{pair}");

	if let Some(fragment) = fragment {
		out.push('#');
		out.push_str(fragment);
	}

	out
}
