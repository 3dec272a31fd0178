use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Document, DocumentStoreError, FieldKind, FieldValue, Query, RecordId, Result,
    query::DOCUMENT_ID,
    store::{DocumentStore, DocumentStream, validate_document},
};

/// PostgreSQL-backed document store.
///
/// Documents live in a single `documents` table keyed by
/// `(collection, id)` with a JSONB body. Query fields are top-level JSON
/// keys; integer fields are cast to `bigint` for comparison and ordering.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool to `database_url` and wraps it.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_document(row: PgRow) -> Result<Document> {
        let id: String = row.try_get("id")?;
        let data: Value = row.try_get("data")?;
        Ok(Document::new(RecordId::from(id), data))
    }
}

/// SQL text for a query, plus the values to bind in placeholder order.
#[derive(Debug)]
struct CompiledQuery {
    sql: String,
    binds: Vec<FieldValue>,
    limit: Option<i64>,
}

/// Text compares under the "C" collation so ordering and resume positions
/// follow byte order whatever the database locale.
fn field_expr(field: &str, kind: FieldKind) -> Result<String> {
    if field == DOCUMENT_ID {
        return Ok(r#"(id COLLATE "C")"#.to_string());
    }
    if field.is_empty()
        || !field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(DocumentStoreError::InvalidQuery(format!(
            "unsupported field name {field:?}"
        )));
    }
    Ok(match kind {
        FieldKind::Text => format!(r#"((data->>'{field}') COLLATE "C")"#),
        FieldKind::Int => format!("((data->>'{field}')::bigint)"),
    })
}

fn compile(query: &Query) -> Result<CompiledQuery> {
    let mut sql = String::from("SELECT id, data FROM documents WHERE collection = $1");
    let mut binds = Vec::new();
    // $1 is the collection name.
    let mut param_count = 1;

    for predicate in query.predicates() {
        let expr = field_expr(&predicate.field, predicate.value.kind())?;
        param_count += 1;
        sql.push_str(&format!(
            " AND {expr} {} ${param_count}",
            predicate.op.as_sql()
        ));
        binds.push(predicate.value.clone());
    }

    let mut order_exprs = Vec::new();
    for key in query.order_keys() {
        let expr = field_expr(&key.field, key.kind)?;
        if key.field != DOCUMENT_ID {
            sql.push_str(&format!(" AND (data->>'{}') IS NOT NULL", key.field));
        }
        order_exprs.push(expr);
    }

    if let Some(values) = query.resume_position() {
        let mut placeholders = Vec::with_capacity(values.len());
        for value in values {
            param_count += 1;
            placeholders.push(format!("${param_count}"));
            binds.push(value.clone());
        }
        sql.push_str(&format!(
            " AND ({}) > ({})",
            order_exprs.join(", "),
            placeholders.join(", ")
        ));
    }

    if order_exprs.is_empty() {
        sql.push_str(r#" ORDER BY (id COLLATE "C") ASC"#);
    } else {
        let ordering: Vec<String> = order_exprs.iter().map(|e| format!("{e} ASC")).collect();
        sql.push_str(&format!(" ORDER BY {}", ordering.join(", ")));
    }

    let limit = query.limit_value().map(|n| i64::try_from(n).unwrap_or(i64::MAX));
    if limit.is_some() {
        param_count += 1;
        sql.push_str(&format!(" LIMIT ${param_count}"));
    }

    Ok(CompiledQuery { sql, binds, limit })
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn create(&self, collection: &str, id: &RecordId, data: Value) -> Result<()> {
        validate_document(collection, &data)?;

        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO NOTHING
            "#,
        )
        .bind(collection)
        .bind(id.as_str())
        .bind(&data)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DocumentStoreError::AlreadyExists {
                collection: collection.to_string(),
                id: id.clone(),
            });
        }
        Ok(())
    }

    async fn get(&self, collection: &str, id: &RecordId) -> Result<Option<Document>> {
        let row: Option<PgRow> =
            sqlx::query("SELECT id, data FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn update(&self, collection: &str, id: &RecordId, data: Value) -> Result<()> {
        validate_document(collection, &data)?;

        let result = sqlx::query(
            r#"
            UPDATE documents SET data = $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id.as_str())
        .bind(&data)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DocumentStoreError::NotFound {
                collection: collection.to_string(),
                id: id.clone(),
            });
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &RecordId) -> Result<()> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DocumentStoreError::NotFound {
                collection: collection.to_string(),
                id: id.clone(),
            });
        }
        Ok(())
    }

    async fn query(&self, query: Query) -> Result<DocumentStream> {
        use futures_util::{StreamExt, stream};

        query.validate()?;
        let compiled = compile(&query)?;
        let collection = query.collection().to_string();
        let pool = self.pool.clone();

        tracing::debug!(sql = %compiled.sql, "compiled document query");

        // The limited result set is fetched in one round trip; rows are
        // decoded as the stream is polled so a bad row fails at its position.
        let rows = async move {
            let mut sqlx_query = sqlx::query(&compiled.sql).bind(collection);
            for value in compiled.binds {
                sqlx_query = match value {
                    FieldValue::Text(s) => sqlx_query.bind(s),
                    FieldValue::Int(i) => sqlx_query.bind(i),
                };
            }
            if let Some(limit) = compiled.limit {
                sqlx_query = sqlx_query.bind(limit);
            }

            match sqlx_query.fetch_all(&pool).await {
                Ok(rows) => rows
                    .into_iter()
                    .map(Self::row_to_document)
                    .collect::<Vec<_>>(),
                Err(e) => vec![Err(DocumentStoreError::Database(e))],
            }
        };

        Ok(Box::pin(stream::once(rows).flat_map(stream::iter)))
    }
}
