//! Variable merge keeping collection, folder, and request tiers apart.

// self
use crate::{
	_prelude::*,
	interpolate::VariableMap,
	tree::{Folder, KeyValue, RequestBlock, RootBlock},
};

/// Merged variables per tier.
///
/// Tiers stay separate because interpolation ranks them as distinct layers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergedVariables {
	/// Collection `req` variables.
	pub collection: VariableMap,
	/// Folder `req` variables; deeper folders win.
	pub folder: VariableMap,
	/// Request `req` variables.
	pub request: VariableMap,
	/// Collection-tier `res` variables.
	pub collection_response: VariableMap,
	/// Folder-tier `res` variables.
	pub folder_response: VariableMap,
	/// Request-tier `res` variables.
	pub request_response: VariableMap,
	/// All `res` variables merged collection → folders → request, in first-seen order.
	pub response: Vec<KeyValue>,
}

/// Merges enabled `req` and `res` variables along the path.
pub fn merge_variables(
	collection: Option<&RootBlock>,
	folders: &[&Folder],
	request: &RequestBlock,
) -> MergedVariables {
	let mut merged = MergedVariables::default();

	if let Some(root) = collection {
		extend(&mut merged.collection, &root.vars.req);
		extend(&mut merged.collection_response, &root.vars.res);
		push_ordered(&mut merged.response, &root.vars.res);
	}
	for root in folders.iter().filter_map(|folder| folder.effective_root()) {
		extend(&mut merged.folder, &root.vars.req);
		extend(&mut merged.folder_response, &root.vars.res);
		push_ordered(&mut merged.response, &root.vars.res);
	}

	extend(&mut merged.request, &request.vars.req);
	extend(&mut merged.request_response, &request.vars.res);
	push_ordered(&mut merged.response, &request.vars.res);

	merged
}

fn extend(map: &mut VariableMap, entries: &[KeyValue]) {
	for var in entries.iter().filter(|v| v.enabled && !v.name.is_empty()) {
		map.insert(var.name.clone(), JsonValue::String(var.value.clone()));
	}
}

fn push_ordered(list: &mut Vec<KeyValue>, entries: &[KeyValue]) {
	for var in entries.iter().filter(|v| v.enabled && !v.name.is_empty()) {
		match list.iter_mut().find(|existing| existing.name == var.name) {
			Some(existing) => existing.value = var.value.clone(),
			None => list.push(var.clone()),
		}
	}
}
