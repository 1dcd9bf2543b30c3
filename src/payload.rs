//! JSON payload adapter: pull reserved fields out of a wire record and merge the stored
//! `extra` payload back in.

use crate::error::AppError;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Wire representation of one record: a flat, ordered JSON object.
pub type Record = Map<String, Value>;

pub const ID: &str = "id";
pub const NAME: &str = "name";
pub const PARENT_ID: &str = "pid";
pub const ORDER: &str = "ord";

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn fetch(obj: &mut Record, key: &str, remove: bool) -> Option<Value> {
    if remove {
        obj.shift_remove(key)
    } else {
        obj.get(key).cloned()
    }
}

/// String value of `key`. Absent, null or non-string values fail and name the key.
pub fn get_required_string(obj: &mut Record, key: &str, remove: bool) -> Result<String, AppError> {
    match fetch(obj, key, remove) {
        None => Err(AppError::MissingKey(key.to_string())),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(AppError::TypeMismatch {
            key: key.to_string(),
            found: type_name(&other),
        }),
    }
}

/// Integer value of `key`. Absent, null, or anything other than a JSON integer that fits
/// in `i32` reads as `None`.
pub fn get_optional_int(obj: &mut Record, key: &str, remove: bool) -> Option<i32> {
    fetch(obj, key, remove)
        .as_ref()
        .and_then(Value::as_i64)
        .and_then(|n| i32::try_from(n).ok())
}

/// The record's `id`, if it carries a usable one. Decides update versus insert in `put`.
pub fn get_optional_id(obj: &mut Record, remove: bool) -> Option<i32> {
    get_optional_int(obj, ID, remove)
}

/// What remains of a record once reserved fields are taken: the `extra` column value.
pub fn to_extra(obj: Record) -> Value {
    Value::Object(obj)
}

/// Shallow-merge a stored `extra` value into `target`; its keys win over same-named keys.
pub fn merge_extra(column: Option<Value>, target: &mut Record) {
    match column {
        None | Some(Value::Null) => {}
        Some(Value::Object(extra)) => {
            for (k, v) in extra {
                target.insert(k, v);
            }
        }
        Some(other) => {
            tracing::warn!(found = type_name(&other), "extra payload is not an object, ignored");
        }
    }
}

/// Dictionary items by id, for resolving extension fields that reference them.
#[derive(Clone, Debug, Default)]
pub struct DictionaryLookup {
    name: String,
    by_id: HashMap<i32, Record>,
}

impl DictionaryLookup {
    /// Index records (as returned by a dictionary listing) by their `id`.
    pub fn from_records(name: impl Into<String>, records: impl IntoIterator<Item = Record>) -> Self {
        let by_id = records
            .into_iter()
            .filter_map(|r| {
                let id = r.get(ID).and_then(Value::as_i64).and_then(|n| i32::try_from(n).ok())?;
                Some((id, r))
            })
            .collect();
        DictionaryLookup {
            name: name.into(),
            by_id,
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Item for `key`; a missing key is a malformed reference.
    pub fn get(&self, key: i32) -> Result<&Record, AppError> {
        self.by_id.get(&key).ok_or_else(|| AppError::LookupKeyNotFound {
            key,
            lookup: self.name.clone(),
        })
    }

    /// Item referenced by `obj[field]`. Absent or null references read as `None`;
    /// a non-integer reference or an unknown key is an error.
    pub fn get_optional(&self, obj: &Record, field: &str) -> Result<Option<&Record>, AppError> {
        match obj.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => {
                let key = as_key(field, v)?;
                self.get(key).map(Some)
            }
        }
    }

    /// Items referenced by an array of ids in `obj[field]`, in array order. Absent or null
    /// reads as an empty list.
    pub fn get_list(&self, obj: &Record, field: &str) -> Result<Vec<&Record>, AppError> {
        match obj.get(field) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(keys)) => keys
                .iter()
                .map(|v| as_key(field, v).and_then(|k| self.get(k)))
                .collect(),
            Some(other) => Err(AppError::TypeMismatch {
                key: field.to_string(),
                found: type_name(other),
            }),
        }
    }
}

fn as_key(field: &str, v: &Value) -> Result<i32, AppError> {
    v.as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| AppError::TypeMismatch {
            key: field.to_string(),
            found: type_name(v),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> Record {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn required_string_removes_and_returns() {
        let mut r = record(json!({"name": "Action", "a": 1}));
        assert_eq!(get_required_string(&mut r, "name", true).unwrap(), "Action");
        assert!(!r.contains_key("name"));
        assert!(r.contains_key("a"));
    }

    #[test]
    fn required_string_keeps_key_when_not_removing() {
        let mut r = record(json!({"name": "Action"}));
        assert_eq!(get_required_string(&mut r, "name", false).unwrap(), "Action");
        assert!(r.contains_key("name"));
    }

    #[test]
    fn required_string_failures_name_the_key() {
        let mut r = record(json!({"a": 1}));
        assert!(matches!(
            get_required_string(&mut r, "name", true),
            Err(AppError::MissingKey(k)) if k == "name"
        ));

        let mut r = record(json!({"name": null}));
        assert!(matches!(
            get_required_string(&mut r, "name", true),
            Err(AppError::TypeMismatch { key, found: "null" }) if key == "name"
        ));

        let mut r = record(json!({"name": 5}));
        assert!(matches!(
            get_required_string(&mut r, "name", true),
            Err(AppError::TypeMismatch { found: "number", .. })
        ));
        // still removed so it never leaks into extra
        assert!(!r.contains_key("name"));
    }

    #[test]
    fn optional_int_is_soft() {
        let mut r = record(json!({"pid": 3, "ord": "x", "big": 5_000_000_000i64, "f": 1.5, "n": null}));
        assert_eq!(get_optional_int(&mut r, "pid", true), Some(3));
        assert_eq!(get_optional_int(&mut r, "ord", true), None);
        assert_eq!(get_optional_int(&mut r, "big", true), None);
        assert_eq!(get_optional_int(&mut r, "f", true), None);
        assert_eq!(get_optional_int(&mut r, "n", true), None);
        assert_eq!(get_optional_int(&mut r, "missing", true), None);
        assert!(r.is_empty());
    }

    #[test]
    fn optional_id_distinguishes_update_from_insert() {
        let mut r = record(json!({"id": 12, "name": "x"}));
        assert_eq!(get_optional_id(&mut r, true), Some(12));
        assert!(!r.contains_key("id"));

        let mut r = record(json!({"id": null, "name": "x"}));
        assert_eq!(get_optional_id(&mut r, true), None);
        assert!(!r.contains_key("id"));

        let mut r = record(json!({"name": "x"}));
        assert_eq!(get_optional_id(&mut r, false), None);
    }

    #[test]
    fn merge_puts_extra_keys_after_reserved_ones() {
        let mut target = record(json!({"id": 1, "name": "X", "pid": null, "ord": 1}));
        merge_extra(Some(json!({"a": 1, "b": 2})), &mut target);
        assert_eq!(
            Value::Object(target.clone()),
            json!({"id": 1, "name": "X", "pid": null, "ord": 1, "a": 1, "b": 2})
        );
        let keys: Vec<&str> = target.keys().map(String::as_str).collect();
        assert_eq!(keys, ["id", "name", "pid", "ord", "a", "b"]);
    }

    #[test]
    fn merge_overwrites_and_tolerates_null() {
        let mut target = record(json!({"id": 1, "a": "old"}));
        merge_extra(Some(json!({"a": "new"})), &mut target);
        assert_eq!(target["a"], "new");

        merge_extra(None, &mut target);
        merge_extra(Some(Value::Null), &mut target);
        merge_extra(Some(json!([1, 2])), &mut target);
        assert_eq!(Value::Object(target), json!({"id": 1, "a": "new"}));
    }

    #[test]
    fn lookup_resolves_and_reports_misses() {
        let lookup = DictionaryLookup::from_records(
            "genres",
            vec![
                record(json!({"id": 1, "name": "Action"})),
                record(json!({"id": 2, "name": "Drama"})),
            ],
        );
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.get(1).unwrap()["name"], "Action");
        assert!(matches!(
            lookup.get(9),
            Err(AppError::LookupKeyNotFound { key: 9, lookup }) if lookup == "genres"
        ));

        let movie = record(json!({"genre": 2, "tags": [2, 1], "none": null, "bad": "x"}));
        assert_eq!(lookup.get_optional(&movie, "genre").unwrap().unwrap()["name"], "Drama");
        assert!(lookup.get_optional(&movie, "none").unwrap().is_none());
        assert!(lookup.get_optional(&movie, "absent").unwrap().is_none());
        assert!(matches!(
            lookup.get_optional(&movie, "bad"),
            Err(AppError::TypeMismatch { .. })
        ));

        let names: Vec<&Value> = lookup
            .get_list(&movie, "tags")
            .unwrap()
            .into_iter()
            .map(|r| &r["name"])
            .collect();
        assert_eq!(names, [&json!("Drama"), &json!("Action")]);
        assert!(lookup.get_list(&movie, "absent").unwrap().is_empty());

        let broken = record(json!({"tags": [1, 7]}));
        assert!(matches!(
            lookup.get_list(&broken, "tags"),
            Err(AppError::LookupKeyNotFound { key: 7, .. })
        ));
    }
}
