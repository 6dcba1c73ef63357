//! Identity and timestamp enrichment
//!
//! Both functions return new maps and leave their input alone.

use crate::record::{Fields, Record, RecordId, CREATED_AT, ID, UPDATED_AT};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

pub fn new_id() -> RecordId {
    Uuid::new_v4().to_string()
}

pub(crate) fn stamp(instant: DateTime<Utc>) -> Value {
    Value::String(instant.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

/// Fresh id plus `created_at`/`updated_at` set to now. Any id or
/// timestamps already in the payload are replaced.
pub fn enrich_with_metadata(payload: &Fields) -> Record {
    let now = stamp(Utc::now());
    let mut fields = Fields::with_capacity(payload.len() + 3);
    fields.insert(ID.to_string(), Value::String(new_id()));
    for (key, value) in payload {
        if !is_reserved(key) {
            fields.insert(key.clone(), value.clone());
        }
    }
    fields.insert(CREATED_AT.to_string(), now.clone());
    fields.insert(UPDATED_AT.to_string(), now);
    Record::new(fields)
}

/// Copy of `updates` with `updated_at` set to now. `id` and `created_at`
/// are stripped silently.
pub fn refresh_timestamp(updates: &Fields) -> Fields {
    let mut fields: Fields = updates
        .iter()
        .filter(|(key, _)| !is_reserved(key))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    fields.insert(UPDATED_AT.to_string(), stamp(Utc::now()));
    fields
}

/// Keep `updated_at` from moving backwards if the wall clock does.
pub(crate) fn not_before(previous: &Record, next: Record) -> Record {
    match (previous.updated_at(), next.updated_at()) {
        (Some(prev), Some(curr)) if curr < prev => {
            let mut fields = next.into_fields();
            fields.insert(UPDATED_AT.to_string(), stamp(prev));
            Record::new(fields)
        }
        _ => next,
    }
}

fn is_reserved(key: &str) -> bool {
    key == ID || key == CREATED_AT || key == UPDATED_AT
}
