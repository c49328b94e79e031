use anyhow::{Context, Result};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection, Executor};
use std::path::Path;
use tracing::debug;

use crate::domain::value::SqliteValue;

// ─────────────────────────────────────────────────────────────────────────────
// Capability probe
// ─────────────────────────────────────────────────────────────────────────────

/// What the destination SQLite build can do. Probed once per run.
#[derive(Debug, Clone)]
pub struct SqliteCaps {
    pub version: String,
    pub json1_available: bool,
    /// STRICT tables landed in SQLite 3.37.
    pub strict_tables_available: bool,
}

fn version_at_least(version: &str, want_major: u32, want_minor: u32) -> bool {
    let mut parts = version.split('.');
    let major: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let minor: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    (major, minor) >= (want_major, want_minor)
}

// ─────────────────────────────────────────────────────────────────────────────
// Destination connection
// ─────────────────────────────────────────────────────────────────────────────

/// The write side: exactly one SQLite connection, exclusive writer of the
/// output file.
pub struct SqliteDest {
    conn: SqliteConnection,
}

impl SqliteDest {
    /// Open (and create if missing) the output file.
    pub async fn connect(path: &Path) -> Result<Self> {
        let conn = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .connect()
            .await
            .with_context(|| format!("Failed to open SQLite file {}", path.display()))?;
        debug!("Opened SQLite destination {}", path.display());
        Ok(Self { conn })
    }

    /// In-memory destination — capability probing without a file, and tests.
    pub async fn connect_in_memory() -> Result<Self> {
        let conn = SqliteConnectOptions::new()
            .filename(":memory:")
            .connect()
            .await
            .context("Failed to open in-memory SQLite")?;
        Ok(Self { conn })
    }

    pub fn conn_mut(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }

    pub async fn probe_capabilities(&mut self) -> Result<SqliteCaps> {
        let version: String = sqlx::query_scalar("SELECT sqlite_version()")
            .fetch_one(&mut self.conn)
            .await
            .context("Failed to read sqlite_version()")?;

        // Probe JSON1 by using it — compile_options no longer lists it on
        // builds where JSON became core (3.38).
        let json1_available = sqlx::query_scalar::<_, i64>("SELECT json_valid('{}')")
            .fetch_one(&mut self.conn)
            .await
            .is_ok();

        let strict_tables_available = version_at_least(&version, 3, 37);
        debug!(
            "SQLite {} (json1: {}, strict tables: {})",
            version, json1_available, strict_tables_available
        );
        Ok(SqliteCaps {
            version,
            json1_available,
            strict_tables_available,
        })
    }

    // ─── Runtime switches ────────────────────────────────────────────────────

    /// Foreign-key enforcement for this connection. Taken down before
    /// streaming (FK cycles and table order stop mattering) and restored on
    /// every exit path by the orchestrator.
    pub async fn set_foreign_keys(&mut self, on: bool) -> Result<()> {
        let pragma = if on {
            "PRAGMA foreign_keys = ON"
        } else {
            "PRAGMA foreign_keys = OFF"
        };
        self.conn
            .execute(pragma)
            .await
            .context("Failed to toggle foreign_keys pragma")?;
        Ok(())
    }

    pub async fn foreign_keys_enabled(&mut self) -> Result<bool> {
        let on: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&mut self.conn)
            .await?;
        Ok(on != 0)
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    pub async fn execute(&mut self, sql: &str) -> Result<()> {
        self.conn
            .execute(sql)
            .await
            .with_context(|| format!("Failed to execute: {sql}"))?;
        Ok(())
    }

    /// Write one batch of rows inside a transaction. The statement is
    /// prepared once per batch and cached by sqlx across batches.
    pub async fn insert_batch(
        &mut self,
        insert_sql: &str,
        rows: &[Vec<SqliteValue>],
    ) -> Result<()> {
        let mut tx = self.conn.begin().await?;
        for row in rows {
            let mut query = sqlx::query(insert_sql);
            for value in row {
                query = bind_value(query, value);
            }
            query.execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Rebuild the file after everything is done. Runs outside any
    /// transaction — SQLite refuses it otherwise.
    pub async fn vacuum(&mut self) -> Result<()> {
        self.conn.execute("VACUUM").await.context("VACUUM failed")?;
        Ok(())
    }
}

/// `INSERT OR IGNORE INTO "t" VALUES (?, …)` — OR IGNORE makes reruns and
/// per-table restarts after a reconnect survivable.
pub fn insert_sql(table: &str, column_count: usize) -> String {
    let placeholders = vec!["?"; column_count].join(", ");
    format!(
        "INSERT OR IGNORE INTO {} VALUES ({})",
        super::ddl::quote_ident(table),
        placeholders
    )
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q SqliteValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqliteValue::Null => query.bind(None::<i64>),
        SqliteValue::Integer(v) => query.bind(*v),
        SqliteValue::Real(v) => query.bind(*v),
        SqliteValue::Text(s) => query.bind(s.as_str()),
        SqliteValue::Blob(b) => query.bind(b.as_slice()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_at_least() {
        assert!(version_at_least("3.37.0", 3, 37));
        assert!(version_at_least("3.45.1", 3, 37));
        assert!(version_at_least("4.0", 3, 37));
        assert!(!version_at_least("3.36.2", 3, 37));
        assert!(!version_at_least("2.9", 3, 37));
        assert!(!version_at_least("garbage", 3, 37));
    }

    #[test]
    fn test_insert_sql_shape() {
        assert_eq!(
            insert_sql("users", 3),
            "INSERT OR IGNORE INTO \"users\" VALUES (?, ?, ?)"
        );
    }

    #[tokio::test]
    async fn test_probe_capabilities_in_memory() {
        let mut dest = SqliteDest::connect_in_memory().await.unwrap();
        let caps = dest.probe_capabilities().await.unwrap();
        // The bundled SQLite is well past 3.37 and ships JSON support.
        assert!(caps.strict_tables_available);
        assert!(caps.json1_available);
        assert!(!caps.version.is_empty());
    }

    #[tokio::test]
    async fn test_foreign_keys_toggle() {
        let mut dest = SqliteDest::connect_in_memory().await.unwrap();
        // Off by default on a fresh connection.
        assert!(!dest.foreign_keys_enabled().await.unwrap());
        dest.set_foreign_keys(true).await.unwrap();
        assert!(dest.foreign_keys_enabled().await.unwrap());
        dest.set_foreign_keys(false).await.unwrap();
        assert!(!dest.foreign_keys_enabled().await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_batch_or_ignore_is_idempotent() {
        let mut dest = SqliteDest::connect_in_memory().await.unwrap();
        dest.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .unwrap();
        let rows = vec![
            vec![SqliteValue::Integer(1), SqliteValue::Text("a".into())],
            vec![SqliteValue::Integer(2), SqliteValue::Null],
        ];
        let sql = insert_sql("t", 2);
        dest.insert_batch(&sql, &rows).await.unwrap();
        dest.insert_batch(&sql, &rows).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM t")
            .fetch_one(dest.conn_mut())
            .await
            .unwrap();
        assert_eq!(count, 2);
    }
}
