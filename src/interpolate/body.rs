//! Interpolation of request bodies and headers.

// self
use crate::{
	_prelude::*,
	interpolate::Interpolator,
	resolve::HeaderSet,
	tree::{Body, GraphqlBody, KeyValue},
};

/// Interpolates a body according to its mode.
///
/// Text modes substitute the raw text, so a variable holding JSON fragments lands verbatim.
/// Structured payloads are serialized, interpolated as text and re-parsed; a payload that no
/// longer parses is returned unchanged.
pub fn interpolate_body(body: &Body, interpolator: &Interpolator) -> Body {
	match body {
		Body::None => Body::None,
		Body::Json(text) => Body::Json(interpolator.interpolate(text)),
		Body::Text(text) => Body::Text(interpolator.interpolate(text)),
		Body::Xml(text) => Body::Xml(interpolator.interpolate(text)),
		Body::Sparql(text) => Body::Sparql(interpolator.interpolate(text)),
		Body::FormUrlEncoded(fields) => Body::FormUrlEncoded(interpolate_fields(fields, interpolator)),
		Body::MultipartForm(fields) => Body::MultipartForm(interpolate_fields(fields, interpolator)),
		Body::Graphql(GraphqlBody { query, variables }) => Body::Graphql(GraphqlBody {
			query: interpolator.interpolate(query),
			variables: interpolator.interpolate(variables),
		}),
		Body::Structured(value) => Body::Structured(interpolate_structured(value, interpolator)),
	}
}

/// Interpolates both header names and values.
pub fn interpolate_headers(headers: &HeaderSet, interpolator: &Interpolator) -> HeaderSet {
	headers.map(|text| interpolator.interpolate(text))
}

fn interpolate_fields(fields: &[KeyValue], interpolator: &Interpolator) -> Vec<KeyValue> {
	fields
		.iter()
		.map(|field| KeyValue {
			name: field.name.clone(),
			value: interpolator.interpolate(&field.value),
			enabled: field.enabled,
		})
		.collect()
}

fn interpolate_structured(value: &JsonValue, interpolator: &Interpolator) -> JsonValue {
	let Ok(text) = serde_json::to_string(value) else {
		return value.clone();
	};
	let rendered = interpolator.interpolate(&text);

	serde_json::from_str(&rendered).unwrap_or_else(|_| value.clone())
}
