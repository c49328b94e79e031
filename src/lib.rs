use anyhow::Result;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

// ─── Log level ────────────────────────────────────────────────────────────────

/// Controls the verbosity of the engine's `tracing` output.
///
/// Pass to [`init_tracing`] before calling any async entry point.
///
/// | Variant | `tracing` level | When to use                          |
/// |---------|-----------------|--------------------------------------|
/// | `Error` | `error`         | `-q` / CI scripting                  |
/// | `Info`  | `info`          | Default — per-table progress lines   |
/// | `Debug` | `debug`         | `--debug` — shows SQL statements too |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    #[default]
    Info,
    Debug,
}

/// Initialise the global `tracing` subscriber.
///
/// Respects `RUST_LOG` when set, falling back to `level` otherwise. When
/// `log_file` is given, a second layer writes every level to that file
/// regardless of the console level.
///
/// Call this **once** at application startup. Library consumers who manage
/// their own subscriber should skip this and configure tracing themselves.
///
/// Only available when the `cli` feature is enabled (pulls in
/// `tracing-subscriber`).
#[cfg(feature = "cli")]
pub fn init_tracing(level: LogLevel, log_file: Option<&std::path::Path>) -> Result<()> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Layer};

    let default_filter = match level {
        LogLevel::Error => "mysql2sqlite=error",
        LogLevel::Info => "mysql2sqlite=info",
        LogLevel::Debug => "mysql2sqlite=debug",
    };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(console_filter);

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .with_filter(EnvFilter::new("mysql2sqlite=debug"));
            tracing_subscriber::registry()
                .with(console_layer)
                .with(file_layer)
                .init();
        }
        None => {
            tracing_subscriber::registry().with(console_layer).init();
        }
    }
    Ok(())
}

// ─── Public API Facade ───

pub use application::transfer::{TableReport, TableState, TransferReport, TransferService};
pub use domain::descriptors::{
    ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor, IndexKind, RefAction,
    TableDescriptor, TableKind,
};
pub use domain::error::TransferError;
pub use domain::plan::{TableSelection, TransferOptions, TransferPlan};
pub use domain::ports::{NullSink, ProgressSink, TransferEvent};
pub use domain::source_type::SourceType;
pub use domain::sqlite_type::{translate_type, Collation, SqliteType, TypeOptions};
pub use domain::value::SqliteValue;
pub use infrastructure::config::{MysqlConfig, TransferConfig};
pub use infrastructure::db::sqlite::SqliteCaps;
pub use presentation::progress::{CompositeSink, LogSink};

// ─── Public entry points ───

/// Run one transfer end to end, reporting progress to `sink`.
///
/// Validates the plan, connects both ends, probes the destination's
/// capabilities, then walks the tables serially: DDL, then data. Returns the
/// per-table report on success; any fatal error aborts the run after the
/// foreign-key switch has been restored.
pub async fn run(cfg: &TransferConfig, sink: &dyn ProgressSink) -> Result<TransferReport> {
    TransferService::new(sink).run(cfg).await
}

/// [`run`] without progress reporting. For embedders that only want the
/// returned report.
pub async fn run_silent(cfg: &TransferConfig) -> Result<TransferReport> {
    run(cfg, &NullSink).await
}
