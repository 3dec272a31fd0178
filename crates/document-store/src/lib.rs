pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::{RecordId, Timestamp};
pub use document::Document;
pub use error::{DocumentStoreError, Result};
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use query::{Clause, DOCUMENT_ID, FieldKind, FieldValue, Operator, OrderKey, Predicate, Query};
pub use store::{DocumentStore, DocumentStoreExt, DocumentStream};
