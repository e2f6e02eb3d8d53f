//! `{{name}}` placeholder substitution with recursive expansion.

// std
use std::sync::LazyLock;
// crates.io
use regex::{Captures, Regex};
// self
use crate::{_prelude::*, interpolate::VariableMap};

const PROCESS_ENV_PREFIX: &str = "process.env.";
const MAX_DEPTH: usize = 10;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\{\{([A-Za-z0-9_.\-$\[\]]+)\}\}").expect("Placeholder pattern is valid.")
});
static INDEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^([^\[]*)((?:\[\d+\])*)$").expect("Index pattern is valid."));

/// Replaces every resolvable placeholder in `text`.
///
/// Unknown names stay literal. A value that itself contains placeholders is expanded in turn;
/// a name that refers back to itself is left literal at the point the cycle closes.
pub fn render(text: &str, vars: &VariableMap, process_env: &VariableMap) -> String {
	let mut stack = Vec::new();

	render_with(text, vars, process_env, &mut stack)
}

/// Looks a placeholder name up without expanding the result.
pub fn lookup(name: &str, vars: &VariableMap, process_env: &VariableMap) -> Option<JsonValue> {
	if let Some(env_name) = name.strip_prefix(PROCESS_ENV_PREFIX) {
		return process_env.get(env_name).cloned();
	}
	if let Some(value) = vars.get(name) {
		return Some(value.clone());
	}

	lookup_path(name, vars)
}

/// Renders a variable value as text: strings as-is, everything else as JSON.
pub fn to_text(value: &JsonValue) -> String {
	match value {
		JsonValue::String(text) => text.clone(),
		other => other.to_string(),
	}
}

fn render_with(
	text: &str,
	vars: &VariableMap,
	process_env: &VariableMap,
	stack: &mut Vec<String>,
) -> String {
	if !text.contains("{{") {
		return text.to_owned();
	}

	PLACEHOLDER
		.replace_all(text, |caps: &Captures| {
			let name = &caps[1];

			if stack.iter().any(|seen| seen == name) || stack.len() >= MAX_DEPTH {
				return caps[0].to_owned();
			}

			let Some(value) = lookup(name, vars, process_env) else {
				return caps[0].to_owned();
			};
			let raw = to_text(&value);

			if !raw.contains("{{") {
				return raw;
			}

			stack.push(name.to_owned());

			let expanded = render_with(&raw, vars, process_env, stack);

			stack.pop();

			expanded
		})
		.into_owned()
}

fn lookup_path(name: &str, vars: &VariableMap) -> Option<JsonValue> {
	let mut segments = name.split('.');
	let (root_key, root_indices) = split_indices(segments.next()?)?;
	let mut current = index_into(vars.get(root_key)?, &root_indices)?;

	for segment in segments {
		let (key, indices) = split_indices(segment)?;
		let next = current.as_object()?.get(key)?;

		current = index_into(next, &indices)?;
	}

	Some(current.clone())
}

fn split_indices(segment: &str) -> Option<(&str, Vec<usize>)> {
	let caps = INDEX.captures(segment)?;
	let key = caps.get(1)?.as_str();
	let indices = caps
		.get(2)
		.map(|m| m.as_str())
		.unwrap_or_default()
		.split(['[', ']'])
		.filter(|part| !part.is_empty())
		.map(str::parse)
		.collect::<Result<Vec<usize>, _>>()
		.ok()?;

	if key.is_empty() {
		return None;
	}

	Some((key, indices))
}

fn index_into<'a>(value: &'a JsonValue, indices: &[usize]) -> Option<&'a JsonValue> {
	indices.iter().try_fold(value, |current, idx| current.as_array()?.get(*idx))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::interpolate::variables;

	fn render_plain(text: &str, vars: &VariableMap) -> String {
		render(text, vars, &VariableMap::new())
	}

	#[test]
	fn replaces_known_and_keeps_unknown() {
		let vars = variables([("host", "api.test"), ("a-b_c.d", "ok")]);

		assert_eq!(render_plain("https://{{host}}/{{missing}}", &vars), "https://api.test/{{missing}}");
		assert_eq!(render_plain("{{a-b_c.d}}", &vars), "ok");
	}

	#[test]
	fn single_braces_and_spaced_names_are_untouched() {
		let vars = variables([("x", "1")]);

		assert_eq!(render_plain("{x}", &vars), "{x}");
		assert_eq!(render_plain("{{ x }}", &vars), "{{ x }}");
		assert_eq!(render_plain("{{{x}}}", &vars), "{1}");
	}

	#[test]
	fn process_env_resolves_from_its_own_layer() {
		let vars = variables([("process.env.HOME", "shadow")]);
		let env = variables([("HOME", "/home/me")]);

		assert_eq!(render("{{process.env.HOME}}", &vars, &env), "/home/me");
		assert_eq!(render("{{process.env.NOPE}}", &vars, &env), "{{process.env.NOPE}}");
	}

	#[test]
	fn nested_values_expand_and_cycles_stay_literal() {
		let vars = variables([
			("base", "https://{{host}}"),
			("host", "api.test"),
			("loop", "{{loop}}"),
			("ping", "{{pong}}"),
			("pong", "{{ping}}"),
		]);

		assert_eq!(render_plain("{{base}}/v1", &vars), "https://api.test/v1");
		assert_eq!(render_plain("{{loop}}", &vars), "{{loop}}");
		assert_eq!(render_plain("{{ping}}", &vars), "{{ping}}");
	}

	#[test]
	fn structured_values_support_paths_and_indices() {
		let mut vars = VariableMap::new();

		vars.insert(
			"user".into(),
			serde_json::json!({ "name": "Ada", "fav-food": ["tea", "cake"], "age": 36 }),
		);

		assert_eq!(render_plain("{{user.name}}", &vars), "Ada");
		assert_eq!(render_plain("{{user.fav-food[1]}}", &vars), "cake");
		assert_eq!(render_plain("{{user.age}}", &vars), "36");
		assert_eq!(render_plain("{{user.fav-food[9]}}", &vars), "{{user.fav-food[9]}}");
		assert_eq!(render_plain("{{user}}", &vars), r#"{"age":36,"fav-food":["tea","cake"],"name":"Ada"}"#);
	}

	#[test]
	fn rendering_resolved_text_is_idempotent() {
		let vars = variables([("a", "1"), ("b", "two")]);
		let once = render_plain("{{a}}-{{b}}-{{c}}", &vars);

		assert_eq!(render_plain(&once, &vars), once);
	}
}
