//! SQLite-backed content store
//!
//! Every collection lives in the shared `content_rows` table as a JSON
//! document. Filters and ordering are evaluated with `json_extract`; `seq`
//! gives the natural insertion order and breaks ordering ties.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::query::Query as SqlxQuery;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::Row as _;
use uuid::Uuid;

use super::{validate_identifier, ContentStore, Filter, Query, StoreError};
use crate::db::DynDatabasePool;
use crate::models::{ContentItem, Row};

type SqliteQuery<'q> = SqlxQuery<'q, Sqlite, SqliteArguments<'q>>;

const VISIBILITY_COLUMN: &str = "is_visible";

/// Content store over the local SQLite database
pub struct SqlxContentStore {
    pool: DynDatabasePool,
}

impl SqlxContentStore {
    /// Create a store over an already migrated pool
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    async fn select(&self, query: &Query, limit: Option<u32>) -> Result<Vec<ContentItem>, StoreError> {
        query.validate()?;
        let sql = build_select(query, limit);

        let mut statement = sqlx::query(&sql).bind(query.collection.as_str());
        for predicate in query.filter.predicates() {
            if !predicate.value.is_null() {
                statement = bind_json(statement, &predicate.value);
            }
        }

        let rows = statement
            .fetch_all(self.pool.as_sqlite())
            .await
            .map_err(db_error)?;

        let items = rows
            .into_iter()
            .filter_map(|row| {
                let id: String = row.get("id");
                match decode_document(row.get::<String, _>("data")) {
                    Ok(item) => Some(item),
                    Err(e) => {
                        tracing::warn!("Skipping {}/{}: {}", query.collection, id, e);
                        None
                    }
                }
            })
            .collect();
        Ok(items)
    }

    async fn load_document(&self, collection: &str, id: &str) -> Result<Row, StoreError> {
        let data: Option<String> =
            sqlx::query_scalar("SELECT data FROM content_rows WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(id)
                .fetch_optional(self.pool.as_sqlite())
                .await
                .map_err(db_error)?;

        let data = data.ok_or_else(|| not_found(collection, id))?;
        serde_json::from_str(&data)
            .map_err(|e| StoreError::Fetch(format!("corrupt document {}/{}: {}", collection, id, e)))
    }
}

fn build_select(query: &Query, limit: Option<u32>) -> String {
    let mut sql = String::from("SELECT id, data FROM content_rows WHERE collection = ?");

    for predicate in query.filter.predicates() {
        if predicate.value.is_null() {
            sql.push_str(&format!(
                " AND json_extract(data, '$.{}') IS NULL",
                predicate.column
            ));
        } else if predicate.column == VISIBILITY_COLUMN {
            // an absent or null flag reads as visible, as on ContentItem
            sql.push_str(&format!(
                " AND IFNULL(json_extract(data, '$.{}'), 1) = ?",
                predicate.column
            ));
        } else {
            sql.push_str(&format!(" AND json_extract(data, '$.{}') = ?", predicate.column));
        }
    }

    match &query.order {
        Some(hint) => sql.push_str(&format!(
            " ORDER BY json_extract(data, '$.{}') {}, seq ASC",
            hint.column,
            if hint.descending { "DESC" } else { "ASC" }
        )),
        None => sql.push_str(" ORDER BY seq ASC"),
    }

    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    sql
}

/// Bind a JSON scalar the way `json_extract` reports it (booleans are 0/1)
fn bind_json<'q>(statement: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::Bool(b) => statement.bind(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => statement.bind(i),
            None => statement.bind(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => statement.bind(s.clone()),
        other => statement.bind(other.to_string()),
    }
}

fn decode_document(data: String) -> Result<ContentItem, StoreError> {
    let row: Row = serde_json::from_str(&data)
        .map_err(|e| StoreError::Fetch(format!("corrupt document: {}", e)))?;
    ContentItem::from_row(row).map_err(|e| StoreError::Fetch(format!("malformed row: {}", e)))
}

/// Reject a document the read path could not decode, before it is written
fn check_document(row: &Row) -> Result<ContentItem, StoreError> {
    ContentItem::from_row(row.clone())
        .map_err(|e| StoreError::InvalidQuery(format!("malformed row: {}", e)))
}

fn db_error(e: sqlx::Error) -> StoreError {
    StoreError::Fetch(format!("database error: {}", e))
}

fn not_found(collection: &str, id: &str) -> StoreError {
    StoreError::NotFound(format!("{}/{}", collection, id))
}

/// The id as a string, whether it was given as text or a number
fn row_id(row: &Row) -> Option<String> {
    match row.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl ContentStore for SqlxContentStore {
    async fn fetch(&self, query: &Query) -> Result<Vec<ContentItem>, StoreError> {
        self.select(query, None).await
    }

    async fn fetch_single(&self, collection: &str, filter: &Filter) -> Result<ContentItem, StoreError> {
        let query = Query::new(collection).with_filter(filter.clone());
        self.select(&query, Some(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(format!("no row in {} matches", collection)))
    }

    async fn insert(&self, collection: &str, mut row: Row) -> Result<ContentItem, StoreError> {
        validate_identifier(collection)?;

        let id = row_id(&row).unwrap_or_else(|| Uuid::new_v4().to_string());
        row.insert("id".to_string(), Value::String(id.clone()));
        let item = check_document(&row)?;
        let data = Value::Object(row).to_string();

        let result = sqlx::query("INSERT INTO content_rows (collection, id, data) VALUES (?, ?, ?)")
            .bind(collection)
            .bind(&id)
            .bind(&data)
            .execute(self.pool.as_sqlite())
            .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(StoreError::Conflict(format!("{}/{} already exists", collection, id)));
            }
            Err(e) => return Err(db_error(e)),
        }

        tracing::debug!("Inserted {}/{}", collection, id);
        Ok(item)
    }

    async fn update(&self, collection: &str, id: &str, patch: Row) -> Result<ContentItem, StoreError> {
        validate_identifier(collection)?;

        let mut document = self.load_document(collection, id).await?;
        for (key, value) in patch {
            if key != "id" {
                document.insert(key, value);
            }
        }
        let item = check_document(&document)?;
        let data = Value::Object(document).to_string();

        let result = sqlx::query(
            "UPDATE content_rows SET data = ?, updated_at = CURRENT_TIMESTAMP WHERE collection = ? AND id = ?",
        )
        .bind(&data)
        .bind(collection)
        .bind(id)
        .execute(self.pool.as_sqlite())
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(not_found(collection, id));
        }

        tracing::debug!("Updated {}/{}", collection, id);
        Ok(item)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        validate_identifier(collection)?;

        let result = sqlx::query("DELETE FROM content_rows WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(self.pool.as_sqlite())
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(not_found(collection, id));
        }
        tracing::debug!("Deleted {}/{}", collection, id);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.pool
            .ping()
            .await
            .map_err(|e| StoreError::Fetch(e.to_string()))
    }
}
