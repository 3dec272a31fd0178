//! Listing request and page types.

use std::collections::BTreeMap;

use common::Timestamp;
use document_store::FieldValue;

/// Optional filters of a listing request.
///
/// Equality filters are kept in field-name order so that identical
/// requests build identical queries. Empty strings and zero integers are
/// accepted here and skipped when the query is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    equals: BTreeMap<String, FieldValue>,
    start_time: Option<Timestamp>,
    end_time: Option<Timestamp>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `field == value`.
    pub fn equal(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.equals.insert(field.into(), value.into());
        self
    }

    /// Adds an equality filter only when a value is given.
    pub fn equal_opt(self, field: impl Into<String>, value: Option<impl Into<FieldValue>>) -> Self {
        match value {
            Some(value) => self.equal(field, value),
            None => self,
        }
    }

    /// Keeps records whose sort timestamp is at or after `start`.
    pub fn start_time(mut self, start: Option<Timestamp>) -> Self {
        self.start_time = start;
        self
    }

    /// Keeps records whose sort timestamp is before `end`.
    pub fn end_time(mut self, end: Option<Timestamp>) -> Self {
        self.end_time = end;
        self
    }

    pub fn equalities(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.equals.iter().map(|(field, value)| (field.as_str(), value))
    }

    pub fn time_range(&self) -> (Option<Timestamp>, Option<Timestamp>) {
        (self.start_time, self.end_time)
    }
}

/// One listing call: filters, requested page size and optional token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRequest {
    pub filters: Filters,
    /// Requested size; clamped before use.
    pub page_size: i32,
    /// Token from a previous page; `None` starts from the beginning.
    pub page_token: Option<String>,
}

impl QueryRequest {
    pub fn new(filters: Filters) -> Self {
        Self {
            filters,
            ..Default::default()
        }
    }

    pub fn page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the continuation token. An empty token means "first page".
    pub fn page_token(mut self, token: Option<impl Into<String>>) -> Self {
        self.page_token = token.map(Into::into).filter(|t: &String| !t.is_empty());
        self
    }
}

/// One page of records and the token for the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<R> {
    pub records: Vec<R>,
    /// `None` once the listing is exhausted.
    pub next_page_token: Option<String>,
}

impl<R> Page<R> {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            next_page_token: None,
        }
    }

    pub fn has_more(&self) -> bool {
        self.next_page_token.is_some()
    }

    /// Maps the records, keeping the token.
    pub fn map<T>(self, f: impl FnMut(R) -> T) -> Page<T> {
        Page {
            records: self.records.into_iter().map(f).collect(),
            next_page_token: self.next_page_token,
        }
    }
}
