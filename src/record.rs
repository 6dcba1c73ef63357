//! Records: field maps with three reserved keys
//!
//! The store never looks inside a payload beyond `id`, `created_at` and
//! `updated_at`. Typed views are recovered with [`Record::decode`].

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ID: &str = "id";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// Field name to value, in insertion order.
pub type Fields = serde_json::Map<String, Value>;

pub type RecordId = String;

/// One stored entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Fields);

impl Record {
    pub fn new(fields: Fields) -> Self {
        Self(fields)
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get(ID).and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Fields {
        &self.0
    }

    pub fn into_fields(self) -> Fields {
        self.0
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(CREATED_AT)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(UPDATED_AT)
    }

    fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.0
            .get(field)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Right-biased field merge. Produces a new record; `self` is untouched.
    pub(crate) fn merged(&self, updates: &Fields) -> Record {
        let mut fields = self.0.clone();
        for (key, value) in updates {
            fields.insert(key.clone(), value.clone());
        }
        Record(fields)
    }

    /// Decode into the reserved metadata plus a typed payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Stored<T>> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|e| Error::InvalidRecord {
            id: self.id().unwrap_or("<no id>").to_string(),
            reason: e.to_string(),
        })
    }
}

impl From<Fields> for Record {
    fn from(fields: Fields) -> Self {
        Self(fields)
    }
}

/// A decoded record: metadata plus the payload shape `T`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<T> {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: T,
}

#[cfg(test)]
impl<T> Stored<T> {
    pub(crate) fn fixture(id: &str, data: T) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            created_at: now,
            updated_at: now,
            data,
        }
    }
}

/// Serialize a payload into a field map.
pub fn to_fields<T: Serialize + ?Sized>(payload: &T) -> Result<Fields> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(Error::InvalidPayload(format!(
            "expected an object, got {}",
            type_name(&other)
        ))),
        Err(e) => Err(Error::InvalidPayload(e.to_string())),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
