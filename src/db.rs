//! SQLite database connection management.
//!
//! Provides a connection pool with WAL mode enabled so that concurrent
//! request handlers can read while another writes. The database file and
//! its parent directories are created if they don't exist.
//!
//! The pool is built once at startup and handed to
//! [`SqliteStore`](crate::sqlite_store::SqliteStore); callers are expected
//! to `close()` it on shutdown.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::Config;

/// Create a connection pool to the configured SQLite database.
///
/// # Errors
///
/// Returns an error if the URL is malformed or the database cannot be
/// opened.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let url = &config.db.url;

    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("Invalid database url: {}", url))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    // Ensure parent directory exists
    let filename = options.get_filename();
    if let Some(parent) = filename.parent() {
        if !parent.as_os_str().is_empty() && filename.as_os_str() != ":memory:" {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db.max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to database: {}", url))?;

    Ok(pool)
}
