//! Query construction as a fixed sequence of stages.
//!
//! Document stores commonly require range filters and resume positions to
//! follow the ordering they depend on, so the stages always run in
//! [`Stage::PIPELINE`] order: equality filters, time range, ordering,
//! resume position, limit.

use document_store::{DOCUMENT_ID, FieldKind, Operator, Query};

use crate::{CursorPosition, Filters, Queryable};

/// Everything needed to build one page query.
#[derive(Debug, Clone, Copy)]
pub struct QuerySpec<'a> {
    pub collection: &'a str,
    pub sort_field: &'a str,
    pub filters: &'a Filters,
    pub cursor: Option<&'a CursorPosition>,
    pub limit: usize,
}

impl<'a> QuerySpec<'a> {
    /// A spec for listing records of type `R`.
    pub fn for_record<R: Queryable>(
        filters: &'a Filters,
        cursor: Option<&'a CursorPosition>,
        limit: usize,
    ) -> Self {
        Self {
            collection: R::COLLECTION,
            sort_field: R::SORT_FIELD,
            filters,
            cursor,
            limit,
        }
    }
}

/// One step of query construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Equality,
    TimeRange,
    OrderBy,
    ResumeAfter,
    Limit,
}

impl Stage {
    /// The order stages are applied in.
    pub const PIPELINE: [Stage; 5] = [
        Stage::Equality,
        Stage::TimeRange,
        Stage::OrderBy,
        Stage::ResumeAfter,
        Stage::Limit,
    ];

    /// Adds this stage's clauses to `query`.
    pub fn apply(self, query: Query, spec: &QuerySpec<'_>) -> Query {
        match self {
            Stage::Equality => spec
                .filters
                .equalities()
                .filter(|(_, value)| !value.is_empty())
                .fold(query, |query, (field, value)| {
                    query.filter(field, Operator::Eq, value.clone())
                }),
            Stage::TimeRange => {
                let (start, end) = spec.filters.time_range();
                let query = match start {
                    Some(start) => query.filter(spec.sort_field, Operator::Gte, start),
                    None => query,
                };
                match end {
                    Some(end) => query.filter(spec.sort_field, Operator::Lt, end),
                    None => query,
                }
            }
            Stage::OrderBy => query
                .order_by(spec.sort_field, FieldKind::Int)
                .order_by(DOCUMENT_ID, FieldKind::Text),
            Stage::ResumeAfter => match spec.cursor {
                Some(cursor) => query.start_after(cursor.resume_values()),
                None => query,
            },
            Stage::Limit => query.limit(spec.limit),
        }
    }
}

/// Builds the page query by running every stage in pipeline order.
pub fn build_query(spec: &QuerySpec<'_>) -> Query {
    Stage::PIPELINE
        .iter()
        .fold(Query::new(spec.collection), |query, stage| {
            stage.apply(query, spec)
        })
}
