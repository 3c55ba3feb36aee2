//! Field-level view of an actor's typed state.
//!
//! The serde schema of `DurableObject::State` is the list of fields. A field
//! whose serialized name starts with `$` is transient: it lives in memory but
//! is never written to the store and survives a reset untouched.
//!
//! Non-finite floats are carried as `{"$float": ...}` tags so they survive
//! the trip through JSON.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::actor::tagged;
use crate::codec::StateCodec;
use crate::error::ActorError;

/// Field name to value.
pub type FieldMap = Map<String, Value>;

/// Leading character of a transient field name.
pub const TRANSIENT_MARKER: char = '$';

/// Whether a field is written to the store.
pub fn is_persistable(name: &str) -> bool {
    !name.starts_with(TRANSIENT_MARKER)
}

/// Every field of the state, transient ones included.
pub fn to_fields<S: Serialize>(state: &S) -> Result<FieldMap, ActorError> {
    match tagged::to_value(state).map_err(|e| ActorError::State(e.to_string()))? {
        Value::Object(fields) => Ok(fields),
        other => Err(ActorError::State(format!(
            "state must serialize to a map of fields, got `{other}`"
        ))),
    }
}

/// The fields that are written to the store.
pub fn persistable_fields<S: Serialize>(state: &S) -> Result<FieldMap, ActorError> {
    let mut fields = to_fields(state)?;
    fields.retain(|name, _| is_persistable(name));
    Ok(fields)
}

/// Rebuild a typed state from its fields.
pub fn from_fields<S: DeserializeOwned>(fields: FieldMap) -> Result<S, ActorError> {
    tagged::from_value(Value::Object(fields)).map_err(|e| ActorError::State(e.to_string()))
}

/// Overlay `overlay` onto the current fields of `state`.
///
/// Fields absent from the overlay keep their current value. On error the
/// state is left untouched.
pub fn apply_fields<S>(state: &mut S, overlay: FieldMap) -> Result<(), ActorError>
where
    S: Serialize + DeserializeOwned,
{
    let mut fields = to_fields(state)?;
    fields.extend(overlay);
    *state = from_fields(fields)?;
    Ok(())
}

/// Current value of a field, `null` if the state has no such field.
pub fn read_field<S: Serialize>(state: &S, name: &str) -> Result<Value, ActorError> {
    Ok(to_fields(state)?.remove(name).unwrap_or(Value::Null))
}

/// Assign one field.
///
/// # Errors
///
/// `FieldNotFound` when the state has no field with that name, or `State`
/// when the value does not fit the field's type.
pub fn write_field<S>(state: &mut S, name: &str, value: Value) -> Result<(), ActorError>
where
    S: Serialize + DeserializeOwned,
{
    let mut fields = to_fields(state)?;
    match fields.get_mut(name) {
        Some(slot) => *slot = value,
        None => return Err(ActorError::FieldNotFound(name.to_string())),
    }
    *state = from_fields(fields)?;
    Ok(())
}

/// Encode the persistable fields as one snapshot text.
pub fn capture_snapshot<S: Serialize>(
    state: &S,
    codec: &dyn StateCodec,
) -> Result<String, ActorError> {
    let fields = persistable_fields(state)?;
    Ok(codec.stringify(&Value::Object(fields))?)
}

/// Drop every persistable field and re-apply a snapshot.
///
/// Transient fields keep their current values.
pub fn restore_snapshot<S>(
    state: &mut S,
    codec: &dyn StateCodec,
    snapshot: &str,
) -> Result<(), ActorError>
where
    S: Serialize + DeserializeOwned,
{
    let defaults = match codec.parse(snapshot)? {
        Value::Object(fields) => fields,
        _ => return Err(ActorError::State("snapshot is not a map of fields".into())),
    };
    let mut fields = to_fields(state)?;
    fields.retain(|name, _| !is_persistable(name));
    fields.extend(defaults);
    *state = from_fields(fields)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;
    use crate::codec::JsonCodec;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
        tags: BTreeSet<String>,
        seen_at: Option<SystemTime>,
        #[serde(rename = "$visits")]
        visits: u32,
    }

    fn profile() -> Profile {
        Profile {
            name: "alice".into(),
            tags: BTreeSet::new(),
            seen_at: None,
            visits: 0,
        }
    }

    #[test]
    fn test_transient_fields_are_not_persistable() {
        let fields = persistable_fields(&profile()).expect("fields");
        let names: Vec<&str> = fields.keys().map(String::as_str).collect();

        assert_eq!(names, vec!["name", "seen_at", "tags"]);
        assert!(!is_persistable("$visits"));
    }

    #[test]
    fn test_non_json_native_fields_roundtrip() {
        let mut original = profile();
        original.tags.insert("admin".into());
        original.tags.insert("beta".into());
        original.seen_at = Some(UNIX_EPOCH + Duration::from_millis(1_700_000_000_123));

        let codec = JsonCodec;
        let stored: Vec<(String, String)> = persistable_fields(&original)
            .expect("fields")
            .into_iter()
            .map(|(k, v)| (k, codec.stringify(&v).expect("stringify")))
            .collect();

        let mut restored = profile();
        let overlay = stored
            .into_iter()
            .map(|(k, text)| (k, codec.parse(&text).expect("parse")))
            .collect();
        apply_fields(&mut restored, overlay).expect("apply");

        assert_eq!(restored, original);
    }

    #[test]
    fn test_apply_fields_keeps_absent_fields() {
        let mut state = profile();
        state.visits = 3;
        let mut overlay = FieldMap::new();
        overlay.insert("name".into(), json!("bob"));

        apply_fields(&mut state, overlay).expect("apply");

        assert_eq!(state.name, "bob");
        assert_eq!(state.visits, 3);
    }

    #[test]
    fn test_apply_fields_rejects_wrong_type() {
        let mut state = profile();
        let mut overlay = FieldMap::new();
        overlay.insert("name".into(), json!(42));

        let result = apply_fields(&mut state, overlay);

        assert!(matches!(result, Err(ActorError::State(_))));
        assert_eq!(state, profile());
    }

    #[test]
    fn test_read_field() {
        let state = profile();
        assert_eq!(read_field(&state, "name").expect("read"), json!("alice"));
        assert_eq!(read_field(&state, "missing").expect("read"), Value::Null);
    }

    #[test]
    fn test_write_field() {
        let mut state = profile();
        write_field(&mut state, "tags", json!(["x", "y"])).expect("write");
        assert!(state.tags.contains("x"));

        let result = write_field(&mut state, "missing", json!(1));
        assert!(matches!(result, Err(ActorError::FieldNotFound(name)) if name == "missing"));
    }

    #[test]
    fn test_restore_snapshot_keeps_transient_fields() {
        let codec = JsonCodec;
        let snapshot = capture_snapshot(&profile(), &codec).expect("capture");

        let mut state = profile();
        state.name = "changed".into();
        state.tags.insert("t".into());
        state.visits = 9;

        restore_snapshot(&mut state, &codec, &snapshot).expect("restore");

        assert_eq!(state.name, "alice");
        assert!(state.tags.is_empty());
        assert_eq!(state.visits, 9);
    }

    #[test]
    fn test_state_must_be_a_map() {
        let result = to_fields(&42u32);
        assert!(matches!(result, Err(ActorError::State(_))));
    }
}
