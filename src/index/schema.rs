//! # Database Schema Module
//!
//! Creates the four tables of the inverted index:
//! 1. `sites` - one row per configured site with its crawl status
//! 2. `pages` - fetched pages, unique per `(site_id, path)`
//! 3. `lemmas` - per-site lemmas with the number of pages containing them
//! 4. `postings` - `(page, lemma, rank)` entries of the inverted index
//!
//! Deletes cascade in application code, so the schema does not depend on the
//! `foreign_keys` pragma being enabled.

use crate::index::error::DbError;
use libsql::{Connection, params};

/// Initialize the database schema
pub async fn initialize_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sites (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            status TEXT NOT NULL,
            status_time INTEGER NOT NULL,
            last_error TEXT
        )",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create sites table: {}", e)))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS pages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            site_id INTEGER NOT NULL,
            path TEXT NOT NULL,
            code INTEGER NOT NULL,
            content TEXT NOT NULL,
            UNIQUE (site_id, path),
            FOREIGN KEY (site_id) REFERENCES sites(id) ON DELETE CASCADE
        )",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create pages table: {}", e)))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS lemmas (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            site_id INTEGER NOT NULL,
            word TEXT NOT NULL,
            frequency INTEGER NOT NULL,
            UNIQUE (site_id, word),
            FOREIGN KEY (site_id) REFERENCES sites(id) ON DELETE CASCADE
        )",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create lemmas table: {}", e)))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS postings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            page_id INTEGER NOT NULL,
            lemma_id INTEGER NOT NULL,
            rank REAL NOT NULL,
            UNIQUE (page_id, lemma_id),
            FOREIGN KEY (page_id) REFERENCES pages(id) ON DELETE CASCADE,
            FOREIGN KEY (lemma_id) REFERENCES lemmas(id) ON DELETE CASCADE
        )",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create postings table: {}", e)))?;

    // Lemma lookups by word across all sites
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_lemmas_word ON lemmas(word)",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create index on lemmas: {}", e)))?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_postings_lemma_id ON postings(lemma_id)",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create index on postings: {}", e)))?;

    Ok(())
}
