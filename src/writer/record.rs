use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use crate::core::types::FieldValue;

/// Read-only view of a bibliographic record.
///
/// Only named-attribute access is required; absent fields return `None`.
pub trait BibliographicRecord: Send + Sync {
    fn key(&self) -> &str;

    fn entry_type(&self) -> &str;

    fn field(&self, name: &str) -> Option<FieldValue>;

    fn added(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn modified(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// Plain record carrying its fields in a map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    pub entry_type: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(default)]
    pub added: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

impl Record {
    pub fn new(key: impl Into<String>, entry_type: impl Into<String>) -> Self {
        Record {
            key: key.into(),
            entry_type: entry_type.into(),
            fields: BTreeMap::new(),
            added: None,
            modified: None,
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn added_at(mut self, added: DateTime<Utc>) -> Self {
        self.added = Some(added);
        self
    }

    pub fn modified_at(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }
}

impl BibliographicRecord for Record {
    fn key(&self) -> &str {
        &self.key
    }

    fn entry_type(&self) -> &str {
        &self.entry_type
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        self.fields.get(name).cloned()
    }

    fn added(&self) -> Option<DateTime<Utc>> {
        self.added
    }

    fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }
}
