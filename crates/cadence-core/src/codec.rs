//! Field-name translation between the application and the store.
//!
//! The application speaks camelCase (`startTime`); persisted records speak
//! snake_case (`start_time`). Every record crossing the store boundary goes
//! through [`encode`] on the way out and [`decode`] on the way back in.
//! Keys without a mapping pass through untouched, which keeps both
//! functions total and makes a double encode harmless.

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{Task, TaskDraft, TaskPatch};

/// A record as the store sees it: a JSON object keyed by persisted names.
pub type WireRecord = Map<String, Value>;

/// Persisted field names.
pub mod wire {
    pub const ID: &str = "id";
    pub const OWNER_ID: &str = "owner_id";
    pub const TITLE: &str = "title";
    pub const NOTES: &str = "notes";
    pub const START_TIME: &str = "start_time";
    pub const END_TIME: &str = "end_time";
    pub const STATUS: &str = "status";
    pub const CHECKLIST: &str = "checklist";
    pub const IS_IMPORTANT: &str = "is_important";
    pub const RECURRENCE: &str = "recurrence";
    pub const RECURRING_TEMPLATE_ID: &str = "recurring_template_id";
    pub const CREATED_AT: &str = "created_at";
}

/// Application-name to persisted-name pairs, listed only where they differ.
const FIELD_MAP: &[(&str, &str)] = &[
    ("ownerId", wire::OWNER_ID),
    ("startTime", wire::START_TIME),
    ("endTime", wire::END_TIME),
    ("isImportant", wire::IS_IMPORTANT),
    ("recurringTemplateId", wire::RECURRING_TEMPLATE_ID),
    ("createdAt", wire::CREATED_AT),
];

fn to_wire_key(key: &str) -> &str {
    FIELD_MAP
        .iter()
        .find(|(app, _)| *app == key)
        .map_or(key, |(_, wire)| wire)
}

fn to_app_key(key: &str) -> &str {
    FIELD_MAP
        .iter()
        .find(|(_, wire)| *wire == key)
        .map_or(key, |(app, _)| app)
}

/// Renames a record's keys from application names to persisted names.
pub fn encode(record: WireRecord) -> WireRecord {
    record
        .into_iter()
        .map(|(key, value)| (to_wire_key(&key).to_string(), value))
        .collect()
}

/// Renames a record's keys from persisted names back to application names.
pub fn decode(record: WireRecord) -> WireRecord {
    record
        .into_iter()
        .map(|(key, value)| (to_app_key(&key).to_string(), value))
        .collect()
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, CoreError> {
    serde_json::to_value(value).map_err(|e| CoreError::Malformed(e.to_string()))
}

/// Serializes a task into a persistable record.
pub fn encode_task(task: &Task) -> Result<WireRecord, CoreError> {
    match to_json(task)? {
        Value::Object(map) => Ok(encode(map)),
        _ => Err(CoreError::Malformed(
            "task did not serialize to an object".to_string(),
        )),
    }
}

/// Serializes a draft into a persistable record owned by `owner_id`.
/// The store assigns the id and creation stamp on insert.
pub fn encode_draft(draft: &TaskDraft, owner_id: Uuid) -> Result<WireRecord, CoreError> {
    let mut record = match to_json(draft)? {
        Value::Object(map) => encode(map),
        _ => {
            return Err(CoreError::Malformed(
                "draft did not serialize to an object".to_string(),
            ))
        }
    };
    record.insert(
        wire::OWNER_ID.to_string(),
        Value::String(owner_id.to_string()),
    );
    Ok(record)
}

/// Builds a persistable record containing only the fields the patch sets.
/// Cleared optional fields become explicit nulls.
pub fn encode_patch(patch: &TaskPatch) -> Result<WireRecord, CoreError> {
    let mut record = WireRecord::new();
    if let Some(title) = &patch.title {
        record.insert(wire::TITLE.to_string(), Value::String(title.clone()));
    }
    if let Some(notes) = &patch.notes {
        let value = match notes {
            Some(text) => Value::String(text.clone()),
            None => Value::Null,
        };
        record.insert(wire::NOTES.to_string(), value);
    }
    if let Some(start_time) = &patch.start_time {
        record.insert(wire::START_TIME.to_string(), to_json(start_time)?);
    }
    if let Some(end_time) = &patch.end_time {
        record.insert(wire::END_TIME.to_string(), to_json(end_time)?);
    }
    if let Some(status) = &patch.status {
        record.insert(wire::STATUS.to_string(), to_json(status)?);
    }
    if let Some(checklist) = &patch.checklist {
        record.insert(wire::CHECKLIST.to_string(), to_json(checklist)?);
    }
    if let Some(is_important) = patch.is_important {
        record.insert(wire::IS_IMPORTANT.to_string(), Value::Bool(is_important));
    }
    if let Some(recurrence) = &patch.recurrence {
        record.insert(wire::RECURRENCE.to_string(), to_json(recurrence)?);
    }
    if let Some(template) = &patch.recurring_template_id {
        let value = match template {
            Some(id) => Value::String(id.to_string()),
            None => Value::Null,
        };
        record.insert(wire::RECURRING_TEMPLATE_ID.to_string(), value);
    }
    Ok(record)
}

/// Deserializes a persisted record into a task. Unknown extra fields are
/// ignored; missing required fields or out-of-set enum values are rejected.
pub fn decode_task(record: WireRecord) -> Result<Task, CoreError> {
    serde_json::from_value(Value::Object(decode(record)))
        .map_err(|e| CoreError::Malformed(e.to_string()))
}
