use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned record identifier. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display sequence number. Assigned once at creation, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayId(pub i64);

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: RecordId,
    pub display_id: DisplayId,
    pub name: String,
    pub id_number: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

/// The mutable attributes of a record, as submitted by the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    pub name: String,
    pub id_number: String,
    pub email: String,
    pub phone: String,
}

impl From<&PersonRecord> for RecordFields {
    fn from(record: &PersonRecord) -> Self {
        Self {
            name: record.name.clone(),
            id_number: record.id_number.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
        }
    }
}

impl PersonRecord {
    pub fn fields(&self) -> RecordFields {
        RecordFields::from(self)
    }
}
