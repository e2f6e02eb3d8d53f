//! Selectable and global environments.

// self
use crate::{_prelude::*, interpolate::VariableMap};

/// Named set of variables.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
	/// Display name.
	pub name: String,
	/// Variables in declaration order.
	pub variables: Vec<EnvironmentVariable>,
}
impl Environment {
	/// Creates an empty environment.
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), variables: Vec::new() }
	}

	/// Appends an enabled variable.
	pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.variables.push(EnvironmentVariable {
			name: name.into(),
			value: value.into(),
			enabled: true,
			secret: false,
		});

		self
	}

	/// Enabled variables as a lookup map; later duplicates win.
	pub fn to_map(&self) -> VariableMap {
		self.variables
			.iter()
			.filter(|var| var.enabled && !var.name.is_empty())
			.map(|var| (var.name.clone(), JsonValue::String(var.value.clone())))
			.collect()
	}
}

/// Environment entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
	/// Name.
	pub name: String,
	/// Value (may reference `{{process.env.X}}`).
	#[serde(default)]
	pub value: String,
	/// Disabled entries are excluded entirely.
	#[serde(default = "enabled_by_default")]
	pub enabled: bool,
	/// Marks values that UIs should mask.
	#[serde(default)]
	pub secret: bool,
}

fn enabled_by_default() -> bool {
	true
}
