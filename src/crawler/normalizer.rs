//! Item normalization and deduplication
//!
//! Turns raw catalog items into [`CatalogRecord`]s and decides whether each
//! one is novel for this run. Malformed items are skipped without affecting
//! the rest of the page.

use crate::state::{CatalogRecord, RunState};
use serde_json::Value;

/// Extracts a positive integer id from a raw item
///
/// Accepts JSON numbers and numeric strings; zero, negatives, fractions and
/// anything else yield `None`.
pub fn extract_id(raw: &Value) -> Option<i64> {
    let id = match raw.get("id")? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };

    (id > 0).then_some(id)
}

/// Normalizes a display name
///
/// Line breaks are removed, then whitespace runs collapse to a single space
/// and the ends are trimmed.
pub fn normalize_name(raw: &str) -> String {
    raw.replace(['\r', '\n'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts and normalizes the item's name, if it has a non-empty one
pub fn extract_name(raw: &Value) -> Option<String> {
    let name = normalize_name(raw.get("name")?.as_str()?);
    (!name.is_empty()).then_some(name)
}

/// Whether the catalog lists this item as a bundle rather than an asset
pub fn is_bundle(raw: &Value) -> bool {
    raw.get("itemType")
        .and_then(Value::as_str)
        .is_some_and(|t| t.eq_ignore_ascii_case("bundle"))
}

/// Normalizes a raw item and claims its id if it is novel
///
/// Returns `None` for malformed items and for ids already persisted or
/// already emitted this run. An accepted id is marked seen for the rest of
/// the run.
pub fn process_item(raw: &Value, state: &mut RunState) -> Option<CatalogRecord> {
    let id = extract_id(raw)?;
    if !state.mark_seen(id) {
        return None;
    }

    let name = extract_name(raw).unwrap_or_else(|| CatalogRecord::placeholder_name(id));
    Some(CatalogRecord::new(id, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_id() {
        assert_eq!(extract_id(&json!({"id": 42})), Some(42));
        assert_eq!(extract_id(&json!({"id": "42"})), Some(42));
        assert_eq!(extract_id(&json!({"id": 0})), None);
        assert_eq!(extract_id(&json!({"id": -3})), None);
        assert_eq!(extract_id(&json!({"id": 1.5})), None);
        assert_eq!(extract_id(&json!({"id": "abc"})), None);
        assert_eq!(extract_id(&json!({"id": null})), None);
        assert_eq!(extract_id(&json!({"name": "no id"})), None);
        assert_eq!(extract_id(&json!([1, 2])), None);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name(" Wave \n Hi "), "Wave Hi");
        assert_eq!(normalize_name("Happy\r\nDance"), "HappyDance");
        assert_eq!(normalize_name("Too    many\tspaces"), "Too many spaces");
        assert_eq!(normalize_name(" \n "), "");
    }

    #[test]
    fn test_is_bundle() {
        assert!(is_bundle(&json!({"id": 1, "itemType": "Bundle"})));
        assert!(!is_bundle(&json!({"id": 1, "itemType": "Asset"})));
        assert!(!is_bundle(&json!({"id": 1})));
    }

    #[test]
    fn test_process_item_normalizes() {
        let mut state = RunState::default();
        let record = process_item(&json!({"id": 42, "name": " Wave \n Hi "}), &mut state);
        assert_eq!(record, Some(CatalogRecord::new(42, "Wave Hi")));
        assert!(state.fetched_this_run.contains(&42));
    }

    #[test]
    fn test_process_item_placeholder_name() {
        let mut state = RunState::default();
        assert_eq!(
            process_item(&json!({"id": 7, "name": "  "}), &mut state),
            Some(CatalogRecord::new(7, "Emote_7"))
        );
        assert_eq!(
            process_item(&json!({"id": 8}), &mut state),
            Some(CatalogRecord::new(8, "Emote_8"))
        );
    }

    #[test]
    fn test_process_item_rejects_zero_id() {
        let mut state = RunState::default();
        assert_eq!(process_item(&json!({"id": 0, "name": "Zero"}), &mut state), None);
        assert!(state.fetched_this_run.is_empty());
    }

    #[test]
    fn test_process_item_rejects_persisted() {
        let mut state = RunState::default();
        state.existing_ids.insert(42);
        assert_eq!(process_item(&json!({"id": 42, "name": "Wave"}), &mut state), None);
        assert!(state.fetched_this_run.is_empty());
    }

    #[test]
    fn test_process_item_rejects_repeat_in_run() {
        let mut state = RunState::default();
        assert!(process_item(&json!({"id": 5, "name": "A"}), &mut state).is_some());
        assert_eq!(process_item(&json!({"id": 5, "name": "A"}), &mut state), None);
    }
}
