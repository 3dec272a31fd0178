use std::cmp::Ordering;

use serde_json::Value;

use crate::{DocumentStoreError, RecordId, Result, Timestamp};

/// Reserved order/filter key that addresses the document key itself.
pub const DOCUMENT_ID: &str = "__name__";

/// The kind of value a field is compared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Int,
}

/// A typed value used in predicates and resume positions.
///
/// Timestamps are compared as Unix nanoseconds and therefore travel as
/// [`FieldValue::Int`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldValue {
    Text(String),
    Int(i64),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Int(_) => FieldKind::Int,
        }
    }

    /// Returns true for the zero value of the kind (`""` or `0`).
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Int(i) => *i == 0,
        }
    }

    /// Reads a JSON value as the requested kind.
    pub fn from_json(value: &Value, kind: FieldKind) -> Option<Self> {
        match kind {
            FieldKind::Text => value.as_str().map(|s| FieldValue::Text(s.to_string())),
            FieldKind::Int => value.as_i64().map(FieldValue::Int),
        }
    }

    /// Compares two values of the same kind. Values of different kinds are
    /// incomparable.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Int(a), FieldValue::Int(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s:?}"),
            FieldValue::Int(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<&RecordId> for FieldValue {
    fn from(id: &RecordId) -> Self {
        FieldValue::Text(id.as_str().to_string())
    }
}

impl From<Timestamp> for FieldValue {
    fn from(ts: Timestamp) -> Self {
        FieldValue::Int(ts.as_nanos())
    }
}

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Operator {
    /// Range operators constrain ordering and must agree with the first
    /// order key.
    pub fn is_range(&self) -> bool {
        !matches!(self, Operator::Eq)
    }

    /// Whether `field <op> value` holds given `field.cmp(value)`.
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Gte => ordering != Ordering::Less,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Lte => ordering != Ordering::Greater,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
        }
    }
}

/// A single filter condition on a top-level document field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: String,
    pub op: Operator,
    pub value: FieldValue,
}

/// An ascending sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub field: String,
    pub kind: FieldKind,
}

/// One step of a query, in the order it was added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    Where(Predicate),
    OrderBy(OrderKey),
    StartAfter(Vec<FieldValue>),
    Limit(usize),
}

impl Clause {
    fn rank(&self) -> u8 {
        match self {
            Clause::Where(_) => 0,
            Clause::OrderBy(_) => 1,
            Clause::StartAfter(_) => 2,
            Clause::Limit(_) => 3,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Clause::Where(_) => "where",
            Clause::OrderBy(_) => "order-by",
            Clause::StartAfter(_) => "start-after",
            Clause::Limit(_) => "limit",
        }
    }
}

/// A query against one collection, expressed as an ordered list of clauses.
///
/// Clauses are kept exactly as added; adapters call [`Query::validate`]
/// before executing, which rejects clause sequences the store cannot run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    collection: String,
    clauses: Vec<Clause>,
}

impl Query {
    /// Creates an unfiltered query over a collection.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            clauses: Vec::new(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Adds a predicate.
    pub fn filter(
        mut self,
        field: impl Into<String>,
        op: Operator,
        value: impl Into<FieldValue>,
    ) -> Self {
        self.clauses.push(Clause::Where(Predicate {
            field: field.into(),
            op,
            value: value.into(),
        }));
        self
    }

    /// Adds an ascending sort key.
    pub fn order_by(mut self, field: impl Into<String>, kind: FieldKind) -> Self {
        self.clauses.push(Clause::OrderBy(OrderKey {
            field: field.into(),
            kind,
        }));
        self
    }

    /// Resumes strictly after the position given by one value per sort key.
    pub fn start_after(mut self, values: Vec<FieldValue>) -> Self {
        self.clauses.push(Clause::StartAfter(values));
        self
    }

    /// Limits the number of documents returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.clauses.push(Clause::Limit(limit));
        self
    }

    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.clauses.iter().filter_map(|c| match c {
            Clause::Where(p) => Some(p),
            _ => None,
        })
    }

    pub fn order_keys(&self) -> impl Iterator<Item = &OrderKey> {
        self.clauses.iter().filter_map(|c| match c {
            Clause::OrderBy(k) => Some(k),
            _ => None,
        })
    }

    pub fn resume_position(&self) -> Option<&[FieldValue]> {
        self.clauses.iter().find_map(|c| match c {
            Clause::StartAfter(values) => Some(values.as_slice()),
            _ => None,
        })
    }

    pub fn limit_value(&self) -> Option<usize> {
        self.clauses.iter().find_map(|c| match c {
            Clause::Limit(n) => Some(*n),
            _ => None,
        })
    }

    /// Checks that the clause sequence is one the store can execute.
    ///
    /// Rules:
    /// - clauses appear in the order where, order-by, start-after, limit
    /// - at most one start-after and one limit
    /// - start-after carries one value per order key, of matching kind
    /// - all range predicates name the same field, and that field is the
    ///   first order key when any ordering is given
    pub fn validate(&self) -> Result<()> {
        let mut last_rank = 0;
        for clause in &self.clauses {
            if clause.rank() < last_rank {
                return Err(DocumentStoreError::InvalidQuery(format!(
                    "{} clause must not follow a later clause",
                    clause.name()
                )));
            }
            last_rank = clause.rank();
        }

        let start_after_count = self
            .clauses
            .iter()
            .filter(|c| matches!(c, Clause::StartAfter(_)))
            .count();
        let limit_count = self
            .clauses
            .iter()
            .filter(|c| matches!(c, Clause::Limit(_)))
            .count();
        if start_after_count > 1 || limit_count > 1 {
            return Err(DocumentStoreError::InvalidQuery(
                "start-after and limit may each appear at most once".to_string(),
            ));
        }

        let keys: Vec<&OrderKey> = self.order_keys().collect();
        if let Some(values) = self.resume_position() {
            if values.len() != keys.len() {
                return Err(DocumentStoreError::InvalidQuery(format!(
                    "start-after has {} values for {} order keys",
                    values.len(),
                    keys.len()
                )));
            }
            for (value, key) in values.iter().zip(&keys) {
                if value.kind() != key.kind {
                    return Err(DocumentStoreError::InvalidQuery(format!(
                        "start-after value {value} does not match kind of order key {}",
                        key.field
                    )));
                }
            }
        }

        let mut range_field: Option<&str> = None;
        for predicate in self.predicates().filter(|p| p.op.is_range()) {
            match range_field {
                Some(field) if field != predicate.field => {
                    return Err(DocumentStoreError::InvalidQuery(format!(
                        "range filters on both {field} and {}",
                        predicate.field
                    )));
                }
                _ => range_field = Some(&predicate.field),
            }
        }
        if let (Some(field), Some(first)) = (range_field, keys.first())
            && first.field != field
        {
            return Err(DocumentStoreError::InvalidQuery(format!(
                "first order key must be the range field {field}, found {}",
                first.field
            )));
        }

        Ok(())
    }
}
