//! Page token encoding.
//!
//! A token is `<hex nanoseconds>,<record id>`: the sort timestamp of the
//! last record delivered, as a signed base-16 integer, followed by that
//! record's id. Tokens already handed to clients must keep decoding, so the
//! format is fixed.

use common::{RecordId, Timestamp};
use document_store::FieldValue;

use crate::{PagingError, Result};

/// The `(sort_timestamp, id)` of the last record already delivered.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CursorPosition {
    pub timestamp: Timestamp,
    pub id: RecordId,
}

impl CursorPosition {
    pub fn new(timestamp: Timestamp, id: RecordId) -> Self {
        Self { timestamp, id }
    }

    /// Encodes the position as an opaque page token.
    pub fn encode(&self) -> String {
        let nanos = self.timestamp.as_nanos();
        if nanos < 0 {
            format!("-{:x},{}", nanos.unsigned_abs(), self.id)
        } else {
            format!("{:x},{}", nanos, self.id)
        }
    }

    /// Decodes a page token.
    ///
    /// The token is split on its first comma; the first part must be a
    /// base-16 `i64` and the remainder a non-empty id.
    pub fn decode(token: &str) -> Result<Self> {
        let invalid = || PagingError::InvalidCursor(token.to_string());

        let (hex, id) = token.split_once(',').ok_or_else(invalid)?;
        if id.is_empty() {
            return Err(invalid());
        }
        let nanos = i64::from_str_radix(hex, 16).map_err(|_| invalid())?;

        Ok(Self {
            timestamp: Timestamp::from_nanos(nanos),
            id: RecordId::from(id),
        })
    }

    /// The position as resume values for a `(sort_field, id)` ordering.
    pub fn resume_values(&self) -> Vec<FieldValue> {
        vec![FieldValue::from(self.timestamp), FieldValue::from(&self.id)]
    }
}

impl std::fmt::Display for CursorPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.timestamp, self.id)
    }
}
