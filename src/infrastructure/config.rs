use sqlx::mysql::{MySqlConnectOptions, MySqlSslMode};
use std::path::PathBuf;

use crate::domain::plan::TransferPlan;

// ─── Structs ──────────────────────────────────────────────────────────────────

/// Connection parameters for the MySQL/MariaDB source.
#[derive(Debug, Clone)]
pub struct MysqlConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
    /// Session character set (`--mysql-charset`, default utf8mb4).
    pub charset: String,
    /// Session collation (`--mysql-collation`); the server default when unset.
    pub collation: Option<String>,
    /// `-S`: disable TLS to the source.
    pub skip_ssl: bool,
}

impl MysqlConfig {
    /// Typed sqlx connect options — no URL assembly, so passwords never need
    /// percent-encoding.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let mut opts = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database)
            .charset(&self.charset);
        if let Some(password) = &self.password {
            opts = opts.password(password);
        }
        if let Some(collation) = &self.collation {
            opts = opts.collation(collation);
        }
        if self.skip_ssl {
            opts = opts.ssl_mode(MySqlSslMode::Disabled);
        }
        opts
    }
}

/// Everything one run needs: source, destination file, and the resolved plan.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    pub mysql: MysqlConfig,
    /// Output SQLite file; created if missing, appended-to idempotently.
    pub sqlite_file: PathBuf,
    pub plan: TransferPlan,
}
