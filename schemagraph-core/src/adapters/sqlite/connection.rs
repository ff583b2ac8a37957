//! SQLite connection handling.
//!
//! # Connection Modes
//! - File-based: `sqlite:///path/to/database.db` or `sqlite://./relative.db`
//! - Plain paths ending in `.db`, `.sqlite` or `.sqlite3`
//! - In-memory: `sqlite::memory:` or `:memory:`
//!
//! File databases are opened read-only. A crawl never writes.

use super::SqliteMetadataSource;
use crate::Result;
use crate::error::SchemaGraphError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

impl SqliteMetadataSource {
    /// Opens a SQLite database for crawling.
    ///
    /// # Errors
    /// Returns error if:
    /// - Connection string format is invalid
    /// - Database cannot be opened
    pub async fn connect(connection_string: &str) -> Result<Self> {
        validate_sqlite_connection_string(connection_string)?;
        let pool = create_sqlite_pool(connection_string).await?;
        tracing::debug!(
            "Opened SQLite database {}",
            crate::error::redact_database_url(&normalize_connection_string(connection_string))
        );
        Ok(Self::from_pool(pool))
    }

    /// Closes the pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// True for in-memory connection strings.
pub fn is_in_memory(connection_string: &str) -> bool {
    connection_string.contains(":memory:") || connection_string.contains("mode=memory")
}

/// Validates SQLite connection string format.
///
/// # Errors
/// Returns error if connection string is invalid
pub fn validate_sqlite_connection_string(connection_string: &str) -> Result<()> {
    if connection_string == ":memory:" {
        return Ok(());
    }

    if connection_string.ends_with(".db")
        || connection_string.ends_with(".sqlite")
        || connection_string.ends_with(".sqlite3")
    {
        return Ok(());
    }

    if connection_string.starts_with("sqlite:") {
        if is_in_memory(connection_string) {
            return Ok(());
        }

        if let Ok(url) = Url::parse(connection_string) {
            if url.scheme() != "sqlite" {
                return Err(SchemaGraphError::configuration(
                    "Connection string must use sqlite:// scheme",
                ));
            }
            return Ok(());
        }

        if connection_string.starts_with("sqlite://") {
            return Ok(());
        }
    }

    Err(SchemaGraphError::configuration(
        "Invalid SQLite connection string format: expected sqlite:// URL, file path, or :memory:",
    ))
}

/// Normalizes a connection string to SQLite URL format.
pub(crate) fn normalize_connection_string(connection_string: &str) -> String {
    if connection_string == ":memory:" {
        return "sqlite::memory:".to_string();
    }

    if connection_string.starts_with("sqlite:") {
        return connection_string.to_string();
    }

    format!("sqlite://{}", connection_string)
}

async fn create_sqlite_pool(connection_string: &str) -> Result<SqlitePool> {
    let normalized = normalize_connection_string(connection_string);
    let in_memory = is_in_memory(&normalized);

    let mut options = SqliteConnectOptions::from_str(&normalized).map_err(|e| {
        SchemaGraphError::configuration(format!("Invalid SQLite connection string: {}", e))
    })?;
    if !in_memory {
        options = options.read_only(true);
    }

    // An in-memory database lives as long as its single connection
    SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(CONNECT_TIMEOUT)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(SchemaGraphError::connection_failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sqlite_connection_string_memory() {
        assert!(validate_sqlite_connection_string(":memory:").is_ok());
        assert!(validate_sqlite_connection_string("sqlite::memory:").is_ok());
        assert!(validate_sqlite_connection_string("sqlite://:memory:").is_ok());
    }

    #[test]
    fn test_validate_sqlite_connection_string_file() {
        assert!(validate_sqlite_connection_string("sqlite:///path/to/db.sqlite").is_ok());
        assert!(validate_sqlite_connection_string("sqlite://./test.db").is_ok());
        assert!(validate_sqlite_connection_string("/path/to/database.db").is_ok());
        assert!(validate_sqlite_connection_string("data.sqlite3").is_ok());
    }

    #[test]
    fn test_validate_sqlite_connection_string_invalid() {
        assert!(validate_sqlite_connection_string("postgres://localhost/db").is_err());
        assert!(validate_sqlite_connection_string("invalid").is_err());
    }

    #[test]
    fn test_normalize_connection_string() {
        assert_eq!(normalize_connection_string(":memory:"), "sqlite::memory:");
        assert_eq!(
            normalize_connection_string("sqlite:///path/db.sqlite"),
            "sqlite:///path/db.sqlite"
        );
        assert_eq!(
            normalize_connection_string("/path/to/db.sqlite"),
            "sqlite:///path/to/db.sqlite"
        );
    }

    #[tokio::test]
    async fn test_connect_in_memory() {
        let source = SqliteMetadataSource::connect(":memory:")
            .await
            .expect("open in-memory database");
        let value: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(source.pool())
            .await
            .expect("query");
        assert_eq!(value, 1);
        source.close().await;
    }
}
