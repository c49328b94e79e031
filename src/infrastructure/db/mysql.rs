use anyhow::{Context, Result};
use sqlx::mysql::MySqlConnection;
use sqlx::{ConnectOptions, Connection, Row};
use tracing::debug;

use crate::domain::descriptors::{
    ColumnDescriptor, ForeignKeyDescriptor, IndexColumn, IndexDescriptor, IndexKind, RefAction,
    TableDescriptor, TableKind,
};
use crate::domain::error::TransferError;
use crate::domain::source_type::SourceType;
use crate::infrastructure::config::MysqlConfig;

// ─────────────────────────────────────────────────────────────────────────────
// Connection
// ─────────────────────────────────────────────────────────────────────────────

/// The read side: exactly one MySQL connection, owned for the whole run.
/// `reconnect` replaces the underlying connection in place — the streamer's
/// reconnect-once policy calls it at most once per table.
pub struct MysqlClient {
    conn: MySqlConnection,
    cfg: MysqlConfig,
}

impl MysqlClient {
    pub async fn connect(cfg: &MysqlConfig) -> Result<Self> {
        let conn = cfg.connect_options().connect().await.with_context(|| {
            format!(
                "Failed to connect to mysql://{}@{}:{}/{}",
                cfg.user, cfg.host, cfg.port, cfg.database
            )
        })?;
        debug!(
            "Connected to {}:{}/{} (charset {})",
            cfg.host, cfg.port, cfg.database, cfg.charset
        );
        Ok(Self {
            conn,
            cfg: cfg.clone(),
        })
    }

    pub async fn reconnect(&mut self) -> Result<()> {
        let fresh = self.cfg.connect_options().connect().await.with_context(|| {
            format!("Reconnect to {}:{} failed", self.cfg.host, self.cfg.port)
        })?;
        // Close the broken connection politely; its error (if any) is moot.
        let _ = std::mem::replace(&mut self.conn, fresh).close().await;
        Ok(())
    }

    pub fn conn_mut(&mut self) -> &mut MySqlConnection {
        &mut self.conn
    }

    pub fn database(&self) -> &str {
        &self.cfg.database
    }

    // ─── Catalog queries ─────────────────────────────────────────────────────
    //
    // Everything below reads information_schema, never SHOW: the catalog gives
    // canonical, stable ordering (ORDINAL_POSITION / SEQ_IN_INDEX) and the raw
    // COLUMN_TYPE strings the translator needs.

    /// The ordered set of tables (and views) in the source database.
    pub async fn fetch_tables(&mut self) -> Result<Vec<(String, TableKind)>> {
        let rows = sqlx::query(
            "SELECT TABLE_NAME, TABLE_TYPE \
             FROM information_schema.TABLES \
             WHERE TABLE_SCHEMA = ? \
             ORDER BY TABLE_NAME",
        )
        .bind(&self.cfg.database)
        .fetch_all(&mut self.conn)
        .await
        .context("Failed to list tables from information_schema")?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.try_get(0)?;
            let table_type: String = row.try_get(1)?;
            let kind = match table_type.as_str() {
                "BASE TABLE" => TableKind::BaseTable,
                "VIEW" => TableKind::View,
                // SYSTEM VIEW etc. never appear in user schemas; skip defensively.
                _ => continue,
            };
            tables.push((name, kind));
        }
        Ok(tables)
    }

    /// Full descriptor for one table: columns (ordinal-sorted), primary key,
    /// secondary indices, foreign keys. Returns introspection warnings
    /// alongside (dropped functional indices and the like).
    pub async fn introspect_table(
        &mut self,
        name: &str,
        kind: TableKind,
    ) -> Result<(TableDescriptor, Vec<String>)> {
        let columns = self.fetch_columns(name).await?;
        let (primary_key, indices, warnings) = match kind {
            TableKind::BaseTable => self.fetch_indices(name).await?,
            // information_schema.STATISTICS has no entries for views.
            TableKind::View => (Vec::new(), Vec::new(), Vec::new()),
        };
        let foreign_keys = match kind {
            TableKind::BaseTable => self.fetch_foreign_keys(name).await?,
            TableKind::View => Vec::new(),
        };

        Ok((
            TableDescriptor {
                name: name.to_string(),
                columns,
                primary_key,
                indices,
                foreign_keys,
                kind,
            },
            warnings,
        ))
    }

    async fn fetch_columns(&mut self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let rows = sqlx::query(
            "SELECT COLUMN_NAME, COLUMN_TYPE, IS_NULLABLE, COLUMN_DEFAULT, EXTRA, \
                    CHARACTER_SET_NAME, COLLATION_NAME \
             FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
             ORDER BY ORDINAL_POSITION",
        )
        .bind(&self.cfg.database)
        .bind(table)
        .fetch_all(&mut self.conn)
        .await
        .with_context(|| format!("Failed to fetch columns for `{table}`"))?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.try_get(0)?;
            let declared_type: String = row.try_get(1)?;
            let is_nullable: String = row.try_get(2)?;
            let default: Option<String> = row.try_get(3)?;
            let extra: String = row.try_get(4)?;
            let charset: Option<String> = row.try_get(5)?;
            let collation: Option<String> = row.try_get(6)?;

            let source_type = SourceType::parse(&declared_type).ok_or_else(|| {
                TransferError::UnknownType {
                    table: table.to_string(),
                    column: name.clone(),
                    declared: declared_type.clone(),
                }
            })?;

            let extra_lower = extra.to_lowercase();
            columns.push(ColumnDescriptor {
                name,
                declared_type,
                source_type,
                nullable: is_nullable.eq_ignore_ascii_case("YES"),
                default,
                auto_increment: extra_lower.contains("auto_increment"),
                on_update_clause: extra_lower.contains("on update"),
                generated: extra_lower.contains("generated"),
                charset,
                collation,
            });
        }
        Ok(columns)
    }

    async fn fetch_indices(
        &mut self,
        table: &str,
    ) -> Result<(Vec<String>, Vec<IndexDescriptor>, Vec<String>)> {
        let rows = sqlx::query(
            "SELECT INDEX_NAME, NON_UNIQUE, INDEX_TYPE, COLUMN_NAME, SUB_PART \
             FROM information_schema.STATISTICS \
             WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
             ORDER BY INDEX_NAME, SEQ_IN_INDEX",
        )
        .bind(&self.cfg.database)
        .bind(table)
        .fetch_all(&mut self.conn)
        .await
        .with_context(|| format!("Failed to fetch indices for `{table}`"))?;

        let mut stats = Vec::with_capacity(rows.len());
        for row in &rows {
            stats.push(StatRow {
                index_name: row.try_get(0)?,
                non_unique: row.try_get::<i64, _>(1)?,
                index_type: row.try_get(2)?,
                column_name: row.try_get(3)?,
                sub_part: row.try_get(4)?,
            });
        }
        Ok(group_indices(table, stats))
    }

    async fn fetch_foreign_keys(&mut self, table: &str) -> Result<Vec<ForeignKeyDescriptor>> {
        let rows = sqlx::query(
            "SELECT kcu.CONSTRAINT_NAME, kcu.COLUMN_NAME, kcu.REFERENCED_TABLE_NAME, \
                    kcu.REFERENCED_COLUMN_NAME, rc.UPDATE_RULE, rc.DELETE_RULE \
             FROM information_schema.KEY_COLUMN_USAGE kcu \
             JOIN information_schema.REFERENTIAL_CONSTRAINTS rc \
               ON rc.CONSTRAINT_SCHEMA = kcu.CONSTRAINT_SCHEMA \
              AND rc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME \
              AND rc.TABLE_NAME = kcu.TABLE_NAME \
             WHERE kcu.TABLE_SCHEMA = ? AND kcu.TABLE_NAME = ? \
               AND kcu.REFERENCED_TABLE_NAME IS NOT NULL \
             ORDER BY kcu.CONSTRAINT_NAME, kcu.ORDINAL_POSITION",
        )
        .bind(&self.cfg.database)
        .bind(table)
        .fetch_all(&mut self.conn)
        .await
        .with_context(|| format!("Failed to fetch foreign keys for `{table}`"))?;

        let mut fk_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            fk_rows.push(FkRow {
                constraint_name: row.try_get(0)?,
                column_name: row.try_get(1)?,
                referenced_table: row.try_get(2)?,
                referenced_column: row.try_get(3)?,
                update_rule: row.try_get(4)?,
                delete_rule: row.try_get(5)?,
            });
        }
        Ok(group_foreign_keys(fk_rows))
    }

    /// Source row count, honouring the per-table cap. Drives progress bars.
    pub async fn count_rows(&mut self, table: &str, limit: Option<u64>) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_mysql_ident(table));
        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&mut self.conn)
            .await
            .with_context(|| format!("Failed to count rows in `{table}`"))?;
        let count = count.max(0) as u64;
        Ok(match limit {
            Some(cap) => count.min(cap),
            None => count,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row grouping (pure, unit-tested)
// ─────────────────────────────────────────────────────────────────────────────

struct StatRow {
    index_name: String,
    non_unique: i64,
    index_type: String,
    column_name: Option<String>,
    sub_part: Option<i64>,
}

/// Group STATISTICS rows (already ordered by name and sequence) into index
/// descriptors. The PRIMARY index becomes the primary-key column list AND
/// stays in the index list tagged `Primary` — the emitter skips it there.
/// MySQL 8 functional index parts have no COLUMN_NAME; such an index cannot
/// be expressed and is dropped whole, with a warning.
fn group_indices(
    table: &str,
    rows: Vec<StatRow>,
) -> (Vec<String>, Vec<IndexDescriptor>, Vec<String>) {
    let mut indices: Vec<IndexDescriptor> = Vec::new();
    let mut functional: Vec<String> = Vec::new();
    let mut warnings = Vec::new();

    for row in rows {
        let column = match row.column_name {
            Some(name) => IndexColumn {
                name,
                prefix_len: row.sub_part.and_then(|p| u32::try_from(p).ok()),
            },
            None => {
                if !functional.contains(&row.index_name) {
                    warnings.push(format!(
                        "table `{}`: functional index `{}` dropped",
                        table, row.index_name
                    ));
                    functional.push(row.index_name.clone());
                }
                continue;
            }
        };

        match indices.iter_mut().find(|i| i.name == row.index_name) {
            Some(existing) => existing.columns.push(column),
            None => {
                let kind = if row.index_name == "PRIMARY" {
                    IndexKind::Primary
                } else if row.index_type.eq_ignore_ascii_case("FULLTEXT") {
                    IndexKind::FullText
                } else if row.index_type.eq_ignore_ascii_case("SPATIAL") {
                    IndexKind::Spatial
                } else if row.non_unique == 0 {
                    IndexKind::Unique
                } else {
                    IndexKind::NonUnique
                };
                indices.push(IndexDescriptor {
                    name: row.index_name,
                    columns: vec![column],
                    kind,
                });
            }
        }
    }

    indices.retain(|i| !functional.contains(&i.name));

    let primary_key = indices
        .iter()
        .find(|i| i.kind == IndexKind::Primary)
        .map(|i| i.columns.iter().map(|c| c.name.clone()).collect())
        .unwrap_or_default();

    (primary_key, indices, warnings)
}

struct FkRow {
    constraint_name: String,
    column_name: String,
    referenced_table: String,
    referenced_column: String,
    update_rule: String,
    delete_rule: String,
}

fn group_foreign_keys(rows: Vec<FkRow>) -> Vec<ForeignKeyDescriptor> {
    let mut fks: Vec<ForeignKeyDescriptor> = Vec::new();
    for row in rows {
        match fks.iter_mut().find(|f| f.name == row.constraint_name) {
            Some(existing) => {
                existing.columns.push(row.column_name);
                existing.referenced_columns.push(row.referenced_column);
            }
            None => fks.push(ForeignKeyDescriptor {
                name: row.constraint_name,
                columns: vec![row.column_name],
                referenced_table: row.referenced_table,
                referenced_columns: vec![row.referenced_column],
                on_update: RefAction::parse(&row.update_rule),
                on_delete: RefAction::parse(&row.delete_rule),
            }),
        }
    }
    fks
}

// ─────────────────────────────────────────────────────────────────────────────
// SQL helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Backtick-quote an identifier for the MySQL side.
pub fn quote_mysql_ident(s: &str) -> String {
    format!("`{}`", s.replace('`', "``"))
}

/// `SELECT` for the row streamer: columns listed explicitly and in descriptor
/// order, so the value adapter can decode by position.
pub fn select_sql(table: &TableDescriptor, limit: Option<u64>) -> String {
    let cols: Vec<String> = table
        .columns
        .iter()
        .map(|c| quote_mysql_ident(&c.name))
        .collect();
    let mut sql = format!(
        "SELECT {} FROM {}",
        cols.join(", "),
        quote_mysql_ident(&table.name)
    );
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    sql
}

/// The "server gone / lost connection" error class eligible for the
/// one-shot reconnect. Anything else is fatal immediately.
pub fn is_connection_lost(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::Protocol(_) => true,
        sqlx::Error::Database(db) => {
            let message = db.message().to_lowercase();
            message.contains("server has gone away")
                || message.contains("lost connection")
                || matches!(db.code().as_deref(), Some("2006") | Some("2013"))
        }
        _ => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(
        index_name: &str,
        non_unique: i64,
        index_type: &str,
        column: Option<&str>,
    ) -> StatRow {
        StatRow {
            index_name: index_name.to_string(),
            non_unique,
            index_type: index_type.to_string(),
            column_name: column.map(|c| c.to_string()),
            sub_part: None,
        }
    }

    #[test]
    fn test_group_indices_primary_and_secondary() {
        let rows = vec![
            stat("PRIMARY", 0, "BTREE", Some("id")),
            stat("email_uq", 0, "BTREE", Some("email")),
            stat("name_idx", 1, "BTREE", Some("last")),
            stat("name_idx", 1, "BTREE", Some("first")),
        ];
        let (pk, indices, warnings) = group_indices("users", rows);
        assert_eq!(pk, vec!["id"]);
        assert!(warnings.is_empty());
        assert_eq!(indices.len(), 3);
        assert_eq!(indices[0].kind, IndexKind::Primary);
        assert_eq!(indices[1].kind, IndexKind::Unique);
        assert_eq!(indices[2].kind, IndexKind::NonUnique);
        assert_eq!(indices[2].column_names(), vec!["last", "first"]);
    }

    #[test]
    fn test_group_indices_composite_primary() {
        let rows = vec![
            stat("PRIMARY", 0, "BTREE", Some("a")),
            stat("PRIMARY", 0, "BTREE", Some("b")),
        ];
        let (pk, indices, _) = group_indices("pairs", rows);
        assert_eq!(pk, vec!["a", "b"]);
        assert_eq!(indices.len(), 1);
    }

    #[test]
    fn test_group_indices_fulltext_and_spatial_kinds() {
        let rows = vec![
            stat("ft", 1, "FULLTEXT", Some("body")),
            stat("sp", 1, "SPATIAL", Some("geo")),
        ];
        let (_, indices, _) = group_indices("posts", rows);
        assert_eq!(indices[0].kind, IndexKind::FullText);
        assert_eq!(indices[1].kind, IndexKind::Spatial);
    }

    #[test]
    fn test_group_indices_drops_functional_whole() {
        let rows = vec![
            stat("expr_idx", 1, "BTREE", Some("a")),
            stat("expr_idx", 1, "BTREE", None),
            stat("ok_idx", 1, "BTREE", Some("b")),
        ];
        let (_, indices, warnings) = group_indices("t", rows);
        assert_eq!(indices.len(), 1);
        assert_eq!(indices[0].name, "ok_idx");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("expr_idx"));
    }

    #[test]
    fn test_group_foreign_keys_composite() {
        let rows = vec![
            FkRow {
                constraint_name: "fk_a".into(),
                column_name: "x1".into(),
                referenced_table: "parent".into(),
                referenced_column: "p1".into(),
                update_rule: "CASCADE".into(),
                delete_rule: "SET NULL".into(),
            },
            FkRow {
                constraint_name: "fk_a".into(),
                column_name: "x2".into(),
                referenced_table: "parent".into(),
                referenced_column: "p2".into(),
                update_rule: "CASCADE".into(),
                delete_rule: "SET NULL".into(),
            },
        ];
        let fks = group_foreign_keys(rows);
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].columns, vec!["x1", "x2"]);
        assert_eq!(fks[0].referenced_columns, vec!["p1", "p2"]);
        assert_eq!(fks[0].on_update, RefAction::Cascade);
        assert_eq!(fks[0].on_delete, RefAction::SetNull);
    }

    #[test]
    fn test_select_sql_lists_columns_in_order() {
        use crate::domain::source_type::SourceType;
        let t = TableDescriptor {
            name: "users".into(),
            columns: ["id", "email"]
                .iter()
                .map(|n| ColumnDescriptor {
                    name: n.to_string(),
                    declared_type: "int".into(),
                    source_type: SourceType::parse("int").unwrap(),
                    nullable: false,
                    default: None,
                    auto_increment: false,
                    on_update_clause: false,
                    generated: false,
                    charset: None,
                    collation: None,
                })
                .collect(),
            primary_key: vec![],
            indices: vec![],
            foreign_keys: vec![],
            kind: TableKind::BaseTable,
        };
        assert_eq!(select_sql(&t, None), "SELECT `id`, `email` FROM `users`");
        assert_eq!(
            select_sql(&t, Some(10)),
            "SELECT `id`, `email` FROM `users` LIMIT 10"
        );
    }

    #[test]
    fn test_quote_mysql_ident() {
        assert_eq!(quote_mysql_ident("users"), "`users`");
        assert_eq!(quote_mysql_ident("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_io_error_is_connection_lost() {
        let err = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert!(is_connection_lost(&err));
        assert!(!is_connection_lost(&sqlx::Error::RowNotFound));
    }
}
