//! Layered `{{variable}}` interpolation.
//!
//! Interpolation never fails: placeholders that do not resolve stay in the text verbatim.

pub mod body;
pub mod layers;
pub mod path;
pub mod template;

pub use body::*;
pub use layers::*;
pub use path::*;

// self
use crate::_prelude::*;

/// Resolves placeholders against one flattened snapshot of [`VariableLayers`].
#[derive(Clone, Debug, Default)]
pub struct Interpolator {
	vars: VariableMap,
	process_env: VariableMap,
}
impl Interpolator {
	/// Flattens `layers` once so repeated lookups are cheap.
	pub fn new(layers: &VariableLayers) -> Self {
		Self { vars: layers.flatten(), process_env: layers.process_env.clone() }
	}

	/// Substitutes every resolvable placeholder in `text`.
	pub fn interpolate(&self, text: &str) -> String {
		template::render(text, &self.vars, &self.process_env)
	}

	/// Walks maps and sequences, interpolating every string leaf.
	///
	/// Object keys and non-string scalars are returned untouched.
	pub fn interpolate_value(&self, value: &JsonValue) -> JsonValue {
		match value {
			JsonValue::String(text) => JsonValue::String(self.interpolate(text)),
			JsonValue::Array(items) =>
				JsonValue::Array(items.iter().map(|item| self.interpolate_value(item)).collect()),
			JsonValue::Object(map) => JsonValue::Object(
				map.iter().map(|(key, item)| (key.clone(), self.interpolate_value(item))).collect(),
			),
			other => other.clone(),
		}
	}

	/// Interpolates a typed value by walking its serialized form.
	///
	/// Returns a clone of `value` when it cannot round-trip through JSON.
	pub fn interpolate_typed<T>(&self, value: &T) -> T
	where
		T: Clone + Serialize + for<'de> Deserialize<'de>,
	{
		let Ok(json) = serde_json::to_value(value) else {
			return value.clone();
		};

		serde_json::from_value(self.interpolate_value(&json)).unwrap_or_else(|_| value.clone())
	}

	/// Looks a name up in the flattened layers without expanding the result.
	pub fn lookup(&self, name: &str) -> Option<JsonValue> {
		template::lookup(name, &self.vars, &self.process_env)
	}
}

/// Interpolates `text` against `layers`.
pub fn interpolate(text: &str, layers: &VariableLayers) -> String {
	Interpolator::new(layers).interpolate(text)
}

/// Interpolates every string leaf of `value` against `layers`.
pub fn interpolate_object(value: &JsonValue, layers: &VariableLayers) -> JsonValue {
	Interpolator::new(layers).interpolate_value(value)
}
