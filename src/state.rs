//! Recursive merging of partial component state.
//!
//! Objects and arrays are both "structured". A partial merges into structured state field by field
//! (array items count as fields named by their index); fields whose current value is missing or
//! scalar are overwritten, structured ones are merged recursively.
//!
//! A string partial counts as an array of its characters, so merging `"ab"` sets the fields `0` and `1`.
//! Other scalar partials have no fields and leave structured state unchanged.
//!
//! Array indices are limited to below 2³² − 1 and to at most [`MAX_INDEX_GAP`] past the current end.
//! Fields beyond that are dropped with a warning rather than allocating the slots in between.

use serde_json::Value;
use tracing::{trace, warn};

/// How far past the end of an array a merged index may reach. The hole in between is filled with `null`.
pub const MAX_INDEX_GAP: usize = 1024;

fn is_structured(value: &Value) -> bool {
	matches!(value, Value::Object(_) | Value::Array(_))
}

/// Applies `partial` to `state`, replacing it outright if it's unset or scalar.
pub fn merge_state(state: &mut Option<Value>, partial: Value) {
	match state {
		Some(current) if is_structured(current) => merge(current, partial),
		_ => *state = Some(partial),
	}
}

fn merge(target: &mut Value, partial: Value) {
	match partial {
		Value::Object(fields) => {
			for (key, value) in fields {
				merge_field(target, key, value)
			}
		}
		Value::Array(items) => {
			for (index, value) in items.into_iter().enumerate() {
				merge_field(target, index.to_string(), value)
			}
		}
		Value::String(text) => {
			for (index, c) in text.chars().enumerate() {
				merge_field(target, index.to_string(), Value::String(c.to_string()))
			}
		}
		scalar => trace!("Scalar partial {} has no fields to merge; leaving structured state unchanged.", kind(&scalar)),
	}
}

fn merge_field(target: &mut Value, key: String, value: Value) {
	match target {
		Value::Object(fields) => match fields.get_mut(&key) {
			Some(current) if is_structured(current) => merge(current, value),
			_ => {
				fields.insert(key, value);
			}
		},
		Value::Array(items) => {
			let index = match key.parse::<usize>() {
				Ok(index) if index < u32::MAX as usize && index <= items.len().saturating_add(MAX_INDEX_GAP) => index,
				Ok(_) => return warn!("Array index {} is out of range for {} item(s); dropping it.", key, items.len()),
				Err(_) => return warn!("Cannot merge field {:?} into an array; dropping it.", key),
			};
			match items.get_mut(index) {
				Some(current) if is_structured(current) => merge(current, value),
				Some(current) => *current = value,
				None => {
					// Holes read as `null`.
					items.resize(index, Value::Null);
					items.push(value)
				}
			}
		}
		_ => unreachable!("`merge_field` is only called on structured values"),
	}
}

fn kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "bool",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn merged(state: Option<Value>, partial: Value) -> Option<Value> {
		let mut state = state;
		merge_state(&mut state, partial);
		state
	}

	#[test]
	fn nested_field_merges() {
		assert_eq!(merged(Some(json!({"a": 1, "b": {"c": 2}})), json!({"b": {"c": 3}})), Some(json!({"a": 1, "b": {"c": 3}})));
	}

	#[test]
	fn top_level_field_overwrites() {
		assert_eq!(merged(Some(json!({"a": 1, "b": {"c": 2}})), json!({"a": 5})), Some(json!({"a": 5, "b": {"c": 2}})));
	}

	#[test]
	fn unset_or_scalar_state_is_replaced() {
		assert_eq!(merged(None, json!(3)), Some(json!(3)));
		assert_eq!(merged(None, json!({"a": 1})), Some(json!({"a": 1})));
		assert_eq!(merged(Some(json!(null)), json!({"a": 1})), Some(json!({"a": 1})));
		assert_eq!(merged(Some(json!("text")), json!({"a": 1})), Some(json!({"a": 1})));
	}

	#[test]
	fn null_and_missing_fields_are_overwritten() {
		assert_eq!(merged(Some(json!({"a": null})), json!({"a": {"x": 1}, "b": 2})), Some(json!({"a": {"x": 1}, "b": 2})));
	}

	#[test]
	fn scalar_partial_leaves_structured_field_alone() {
		assert_eq!(merged(Some(json!({"b": {"c": 2}})), json!({"b": 5})), Some(json!({"b": {"c": 2}})));
		assert_eq!(merged(Some(json!({"a": 1})), json!(7)), Some(json!({"a": 1})));
		assert_eq!(merged(Some(json!({"a": 1})), json!(true)), Some(json!({"a": 1})));
	}

	#[test]
	fn arrays_merge_by_index() {
		assert_eq!(merged(Some(json!({"squares": [null, "X", null]})), json!({"squares": [null, null, "O"]})), Some(json!({"squares": [null, null, "O"]})));
		assert_eq!(merged(Some(json!([{"a": 1}, 2])), json!([{"b": 2}, 3, 4])), Some(json!([{"a": 1, "b": 2}, 3, 4])));
	}

	#[test]
	fn array_partial_into_object_uses_index_keys() {
		assert_eq!(merged(Some(json!({"x": 1})), json!(["a"])), Some(json!({"x": 1, "0": "a"})));
	}

	#[test]
	fn object_partial_into_array() {
		assert_eq!(merged(Some(json!([1, 2])), json!({"1": 5, "3": 7, "name": "dropped"})), Some(json!([1, 5, null, 7])));
	}

	#[test]
	fn huge_array_indices_are_dropped() {
		assert_eq!(merged(Some(json!([1, 2])), json!({"18446744073709551615": 1})), Some(json!([1, 2])));
		assert_eq!(merged(Some(json!([1, 2])), json!({"4294967295": 1, "0": 3})), Some(json!([3, 2])));
		assert_eq!(merged(Some(json!([])), json!({ (MAX_INDEX_GAP + 1).to_string(): 1 })), Some(json!([])));

		let mut expected = vec![Value::Null; MAX_INDEX_GAP];
		expected.push(json!(1));
		assert_eq!(merged(Some(json!([])), json!({ MAX_INDEX_GAP.to_string(): 1 })), Some(Value::Array(expected)));
	}

	#[test]
	fn string_partial_merges_its_characters() {
		assert_eq!(merged(Some(json!({"x": 1})), json!("ab")), Some(json!({"x": 1, "0": "a", "1": "b"})));
		assert_eq!(merged(Some(json!(["z", "y", "x"])), json!("ab")), Some(json!(["a", "b", "x"])));
		assert_eq!(merged(Some(json!({"name": {"first": "a"}})), json!({"name": "b"})), Some(json!({"name": {"first": "a", "0": "b"}})));
	}
}
