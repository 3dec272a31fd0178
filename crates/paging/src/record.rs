//! Records that can be listed page by page.

use common::{RecordId, Timestamp};
use serde::de::DeserializeOwned;

use crate::CursorPosition;

/// A persisted record with a sort timestamp and a unique id.
///
/// Listings order by `(SORT_FIELD, id)` ascending; the id breaks ties so
/// that pages neither repeat nor skip records sharing a timestamp.
pub trait Queryable: DeserializeOwned + Send + 'static {
    /// Collection the records are stored in.
    const COLLECTION: &'static str;

    /// Top-level field holding the sort timestamp as Unix nanoseconds.
    const SORT_FIELD: &'static str;

    fn record_id(&self) -> &RecordId;

    fn sort_timestamp(&self) -> Timestamp;

    /// Resume position immediately after this record.
    fn cursor_position(&self) -> CursorPosition {
        CursorPosition::new(self.sort_timestamp(), self.record_id().clone())
    }
}
