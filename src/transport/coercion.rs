use chrono::NaiveDateTime;

use crate::domain::Value;

const BOOLEAN_FIELDS: &[&str] = &["Cancelled", "Queued", "Sent"];
const TIMESTAMP_FIELDS: &[&str] = &["SentDateTime"];

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Boolean,
    Timestamp,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field {field} has malformed timestamp {value:?}: {source}")]
pub struct MalformedTimestamp {
    pub field: String,
    pub value: String,
    #[source]
    pub source: chrono::ParseError,
}

/// Kind of a leaf field; depends on the element name only.
pub fn field_kind(name: &str) -> FieldKind {
    if BOOLEAN_FIELDS.contains(&name) {
        FieldKind::Boolean
    } else if TIMESTAMP_FIELDS.contains(&name) {
        FieldKind::Timestamp
    } else {
        FieldKind::Text
    }
}

pub fn coerce(field: &str, raw: &str) -> Result<Value, MalformedTimestamp> {
    match field_kind(field) {
        FieldKind::Boolean => Ok(Value::Bool(raw == "true")),
        FieldKind::Timestamp => NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
            .map(Value::Timestamp)
            .map_err(|source| MalformedTimestamp {
                field: field.to_owned(),
                value: raw.to_owned(),
                source,
            }),
        FieldKind::Text => Ok(Value::Text(raw.to_owned())),
    }
}
