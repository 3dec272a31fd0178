//! Shared pieces of the listing endpoints.

use chrono::{DateTime, Utc};
use common::Timestamp;
use paging::Page;
use serde::Serialize;

use crate::error::ApiError;

/// One page of a listing. An empty `next_page_token` means no more pages.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub records: Vec<T>,
    pub next_page_token: String,
}

impl<T> ListResponse<T> {
    pub fn from_page<R>(page: Page<R>, to_response: impl FnMut(R) -> T) -> Self {
        let next_page_token = page.next_page_token.clone().unwrap_or_default();
        Self {
            records: page.map(to_response).records,
            next_page_token,
        }
    }
}

/// Parses an optional RFC 3339 query parameter. Empty values are ignored.
pub fn parse_time(name: &str, value: Option<&str>) -> Result<Option<Timestamp>, ApiError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let datetime = DateTime::parse_from_rfc3339(value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid {name}: {e}")))?
        .with_timezone(&Utc);
    Timestamp::from_datetime(datetime)
        .map(Some)
        .ok_or_else(|| ApiError::BadRequest(format!("{name} is out of range")))
}

/// Filter values arrive as strings; empty ones are treated as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
