//! Database operations for the index module
//!
//! `Database` is a cheap-to-clone handle over one libsql connection. The store
//! operations are split by table into `sites.rs`, `pages.rs`, `lemmas.rs` and
//! `postings.rs`; this file holds construction, shared helpers and row mapping.

use crate::index::error::DbError;
use crate::index::schema;
use crate::index::{Lemma, Page, Posting, Site};
use chrono::DateTime;
use libsql::{Connection, Row, Rows, Value};
use tracing::instrument;

/// Rows per multi-value INSERT statement
pub(crate) const INSERT_CHUNK: usize = 200;

/// Bound parameters per `IN (...)` lookup
pub(crate) const LOOKUP_CHUNK: usize = 500;

/// Database manager for the index
#[derive(Clone)]
pub struct Database {
    pub(crate) conn: Connection,
}

impl Database {
    /// Create a new database manager
    #[instrument(skip(conn))]
    pub async fn new(conn: Connection) -> Result<Self, DbError> {
        schema::initialize_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Create a new database manager from a path
    pub async fn new_from_path(path: &str) -> Result<Self, DbError> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DbError::Connection(format!("Failed to open database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| DbError::Connection(format!("Failed to connect to database: {}", e)))?;

        Self::new(conn).await
    }

    /// Execute a custom query with parameters
    pub async fn execute_query<P>(&self, sql: &str, params: P) -> Result<Rows, DbError>
    where
        P: libsql::params::IntoParams,
    {
        self.conn
            .query(sql, params)
            .await
            .map_err(|e| DbError::Query(format!("Failed to execute query: {}", e)))
    }

    /// Run a query and map every row
    pub(crate) async fn query_all<P, T>(
        &self,
        sql: &str,
        params: P,
        map: fn(&Row) -> Result<T, DbError>,
    ) -> Result<Vec<T>, DbError>
    where
        P: libsql::params::IntoParams,
    {
        let mut rows = self.execute_query(sql, params).await?;

        let mut items = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DbError::Data(format!("Failed to read row: {}", e)))?
        {
            items.push(map(&row)?);
        }
        Ok(items)
    }

    /// Run a query returning at most one mapped row
    pub(crate) async fn query_one<P, T>(
        &self,
        sql: &str,
        params: P,
        map: fn(&Row) -> Result<T, DbError>,
    ) -> Result<Option<T>, DbError>
    where
        P: libsql::params::IntoParams,
    {
        let mut rows = self.execute_query(sql, params).await?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(map(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DbError::Data(format!("Failed to read row: {}", e))),
        }
    }

    /// Run a `SELECT COUNT(*)` style query
    pub(crate) async fn query_count<P>(&self, sql: &str, params: P) -> Result<i64, DbError>
    where
        P: libsql::params::IntoParams,
    {
        Ok(self
            .query_one(sql, params, |row| int_column(row, 0))
            .await?
            .unwrap_or(0))
    }

    /// Execute a statement and return the number of affected rows
    pub(crate) async fn execute<P>(&self, sql: &str, params: P) -> Result<u64, DbError>
    where
        P: libsql::params::IntoParams,
    {
        self.conn
            .execute(sql, params)
            .await
            .map_err(|e| DbError::Query(format!("Failed to execute statement: {}", e)))
    }
}

/// `?, ?, ?` with `count` placeholders
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

pub(crate) fn int_column(row: &Row, idx: i32) -> Result<i64, DbError> {
    row.get::<i64>(idx)
        .map_err(|e| DbError::Data(format!("Failed to read column {}: {}", idx, e)))
}

pub(crate) fn real_column(row: &Row, idx: i32) -> Result<f64, DbError> {
    row.get::<f64>(idx)
        .map_err(|e| DbError::Data(format!("Failed to read column {}: {}", idx, e)))
}

pub(crate) fn text_column(row: &Row, idx: i32) -> Result<String, DbError> {
    row.get::<String>(idx)
        .map_err(|e| DbError::Data(format!("Failed to read column {}: {}", idx, e)))
}

pub(crate) fn optional_text_column(row: &Row, idx: i32) -> Result<Option<String>, DbError> {
    match row.get_value(idx) {
        Ok(Value::Null) => Ok(None),
        Ok(Value::Text(text)) => Ok(Some(text)),
        Ok(other) => Err(DbError::Data(format!(
            "Unexpected value in column {}: {:?}",
            idx, other
        ))),
        Err(e) => Err(DbError::Data(format!("Failed to read column {}: {}", idx, e))),
    }
}

pub(crate) fn row_to_site(row: &Row) -> Result<Site, DbError> {
    let status = text_column(row, 3)?;
    let status_time = int_column(row, 4)?;
    Ok(Site {
        id: int_column(row, 0)?,
        url: text_column(row, 1)?,
        name: text_column(row, 2)?,
        status: status.parse()?,
        status_time: DateTime::from_timestamp(status_time, 0)
            .ok_or_else(|| DbError::Data(format!("Invalid status time: {}", status_time)))?,
        last_error: optional_text_column(row, 5)?,
    })
}

pub(crate) fn row_to_page(row: &Row) -> Result<Page, DbError> {
    let code = int_column(row, 3)?;
    Ok(Page {
        id: int_column(row, 0)?,
        site_id: int_column(row, 1)?,
        path: text_column(row, 2)?,
        code: u16::try_from(code)
            .map_err(|_| DbError::Data(format!("Invalid status code: {}", code)))?,
        content: text_column(row, 4)?,
    })
}

pub(crate) fn row_to_lemma(row: &Row) -> Result<Lemma, DbError> {
    Ok(Lemma {
        id: int_column(row, 0)?,
        site_id: int_column(row, 1)?,
        word: text_column(row, 2)?,
        frequency: int_column(row, 3)?,
    })
}

pub(crate) fn row_to_posting(row: &Row) -> Result<Posting, DbError> {
    Ok(Posting {
        id: int_column(row, 0)?,
        page_id: int_column(row, 1)?,
        lemma_id: int_column(row, 2)?,
        rank: real_column(row, 3)?,
    })
}
