//! Variable layers in precedence order.

// self
use crate::{_prelude::*, interpolate::template};

/// Name to value map for one layer. Values are usually strings but may be structured.
pub type VariableMap = HashMap<String, JsonValue>;

/// Every variable layer visible to one request, lowest precedence first.
///
/// `process_env` is not part of the ranking: `{{process.env.NAME}}` always resolves against it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VariableLayers {
	/// Global environment.
	pub global_environment: VariableMap,
	/// Collection variables.
	pub collection: VariableMap,
	/// Selected environment.
	pub environment: VariableMap,
	/// Folder variables.
	pub folder: VariableMap,
	/// Request variables.
	pub request: VariableMap,
	/// Variables derived from acquired OAuth2 credentials.
	pub oauth2_credentials: VariableMap,
	/// Variables set by scripts at runtime.
	pub runtime: VariableMap,
	/// Values the user typed into prompts.
	pub prompt: VariableMap,
	/// Process environment.
	pub process_env: VariableMap,
}
impl VariableLayers {
	/// Creates empty layers.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the global environment layer.
	pub fn with_global_environment(mut self, vars: VariableMap) -> Self {
		self.global_environment = vars;

		self
	}

	/// Sets the collection layer.
	pub fn with_collection(mut self, vars: VariableMap) -> Self {
		self.collection = vars;

		self
	}

	/// Sets the selected environment layer.
	pub fn with_environment(mut self, vars: VariableMap) -> Self {
		self.environment = vars;

		self
	}

	/// Sets the folder layer.
	pub fn with_folder(mut self, vars: VariableMap) -> Self {
		self.folder = vars;

		self
	}

	/// Sets the request layer.
	pub fn with_request(mut self, vars: VariableMap) -> Self {
		self.request = vars;

		self
	}

	/// Sets the OAuth2 credential layer.
	pub fn with_oauth2_credentials(mut self, vars: VariableMap) -> Self {
		self.oauth2_credentials = vars;

		self
	}

	/// Sets the runtime layer.
	pub fn with_runtime(mut self, vars: VariableMap) -> Self {
		self.runtime = vars;

		self
	}

	/// Sets the prompt layer.
	pub fn with_prompt(mut self, vars: VariableMap) -> Self {
		self.prompt = vars;

		self
	}

	/// Sets the process environment.
	pub fn with_process_env(mut self, vars: VariableMap) -> Self {
		self.process_env = vars;

		self
	}

	/// Flattens the ranked layers into one map; higher layers overwrite lower ones.
	///
	/// Environment values are first expanded against the process environment alone, so an
	/// environment entry defined as `{{process.env.API_KEY}}` carries the real key.
	pub fn flatten(&self) -> VariableMap {
		let process_only = VariableMap::new();
		let environment = self.environment.iter().map(|(name, value)| {
			let value = match value {
				JsonValue::String(text) =>
					JsonValue::String(template::render(text, &process_only, &self.process_env)),
				other => other.clone(),
			};

			(name.clone(), value)
		});
		let mut combined = self.global_environment.clone();

		combined.extend(self.collection.iter().map(|(k, v)| (k.clone(), v.clone())));
		combined.extend(environment);

		for layer in [&self.folder, &self.request, &self.oauth2_credentials, &self.runtime, &self.prompt]
		{
			combined.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
		}

		combined
	}
}

/// Builds a [`VariableMap`] from string pairs.
pub fn variables<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> VariableMap
where
	N: Into<String>,
	V: Into<String>,
{
	pairs.into_iter().map(|(name, value)| (name.into(), JsonValue::String(value.into()))).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn higher_layers_win() {
		let layers = VariableLayers::new()
			.with_global_environment(variables([("v", "global"), ("g", "only-global")]))
			.with_collection(variables([("v", "collection")]))
			.with_environment(variables([("v", "environment")]))
			.with_folder(variables([("v", "folder")]))
			.with_request(variables([("v", "request")]));
		let flat = layers.clone().flatten();

		assert_eq!(flat.get("v"), Some(&JsonValue::from("request")));
		assert_eq!(flat.get("g"), Some(&JsonValue::from("only-global")));

		let flat = layers.with_runtime(variables([("v", "runtime")])).flatten();

		assert_eq!(flat.get("v"), Some(&JsonValue::from("runtime")));
	}

	#[test]
	fn prompt_beats_runtime() {
		let flat = VariableLayers::new()
			.with_runtime(variables([("v", "runtime")]))
			.with_prompt(variables([("v", "prompt")]))
			.flatten();

		assert_eq!(flat.get("v"), Some(&JsonValue::from("prompt")));
	}

	#[test]
	fn environment_values_expand_process_env_first() {
		let flat = VariableLayers::new()
			.with_environment(variables([("apiKey", "{{process.env.API_KEY}}"), ("other", "{{host}}")]))
			.with_process_env(variables([("API_KEY", "secret")]))
			.flatten();

		assert_eq!(flat.get("apiKey"), Some(&JsonValue::from("secret")));
		assert_eq!(flat.get("other"), Some(&JsonValue::from("{{host}}")));
	}
}
