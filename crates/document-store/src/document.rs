use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::query::{DOCUMENT_ID, FieldKind, FieldValue};
use crate::{RecordId, Result};

/// A stored document: its key within a collection plus its JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: RecordId,
    pub data: Value,
}

impl Document {
    pub fn new(id: RecordId, data: Value) -> Self {
        Self { id, data }
    }

    /// Reads a top-level field as a typed query value.
    ///
    /// [`DOCUMENT_ID`] resolves to the document key. Returns `None` when the
    /// field is missing or holds a value of another kind.
    pub fn field_value(&self, field: &str, kind: FieldKind) -> Option<FieldValue> {
        if field == DOCUMENT_ID {
            return match kind {
                FieldKind::Text => Some(FieldValue::Text(self.id.as_str().to_string())),
                FieldKind::Int => None,
            };
        }
        self.data
            .get(field)
            .and_then(|value| FieldValue::from_json(value, kind))
    }

    /// Deserializes the document body into a record type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}
