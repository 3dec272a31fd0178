//! Cursor-based, filterable, paginated querying.
//!
//! This crate turns a listing request into a store query and one page of
//! typed records:
//! - [`PageSizeLimits`] clamps the requested page size
//! - [`CursorPosition`] encodes and decodes opaque page tokens
//! - [`build_query`] applies filters, ordering, resume position and limit
//!   as a fixed pipeline of [`Stage`]s
//! - [`PageExecutor`] runs the query and decides whether another page may exist
//! - [`Paginator`] wires the above together for a [`Queryable`] record type

pub mod cursor;
pub mod error;
pub mod executor;
pub mod page_size;
pub mod paginator;
pub mod pipeline;
pub mod record;
pub mod request;

pub use cursor::CursorPosition;
pub use error::{PagingError, Result};
pub use executor::PageExecutor;
pub use page_size::{
    ClampedPageSize, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageSizeAdjustment, PageSizeLimits,
};
pub use paginator::Paginator;
pub use pipeline::{QuerySpec, Stage, build_query};
pub use record::Queryable;
pub use request::{Filters, Page, QueryRequest};
pub use tokio_util::sync::CancellationToken;
