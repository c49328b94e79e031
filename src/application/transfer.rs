use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::application::streamer::RowStreamer;
use crate::domain::descriptors::{TableDescriptor, TableKind};
use crate::domain::error::TransferError;
use crate::domain::plan::{TableSelection, TransferPlan};
use crate::domain::ports::{ProgressSink, TransferEvent};
use crate::domain::sqlite_type::TypeOptions;
use crate::infrastructure::config::TransferConfig;
use crate::infrastructure::db::ddl::{DdlEmitter, DdlOptions};
use crate::infrastructure::db::mysql::MysqlClient;
use crate::infrastructure::db::sqlite::{SqliteCaps, SqliteDest};

// ─────────────────────────────────────────────────────────────────────────────
// Reports
// ─────────────────────────────────────────────────────────────────────────────

/// Per-table lifecycle. DDL success moves Pending → DdlCreated; the streamer
/// moves DdlCreated → DataStreaming → DataDone. Failed is terminal for the
/// whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TableState {
    Pending,
    DdlCreated,
    DataStreaming,
    DataDone,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub name: String,
    pub rows: u64,
    pub state: TableState,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    pub sqlite_file: PathBuf,
    pub sqlite_version: String,
    pub tables: Vec<TableReport>,
    pub total_rows: u64,
    pub warnings: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ─────────────────────────────────────────────────────────────────────────────

/// Drives the pipeline: probe → connect → introspect → per table DDL + data →
/// optional VACUUM. Strictly serial; the two connections are the only
/// resources and each phase owns them in turn.
pub struct TransferService<'a> {
    sink: &'a dyn ProgressSink,
}

impl<'a> TransferService<'a> {
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self { sink }
    }

    pub async fn run(&self, cfg: &TransferConfig) -> Result<TransferReport> {
        cfg.plan.validate()?;

        let mut dest = SqliteDest::connect(&cfg.sqlite_file).await?;
        let caps = dest.probe_capabilities().await?;
        let mut source = MysqlClient::connect(&cfg.mysql).await?;

        let mut warnings = Vec::new();
        let (descriptors, intro_warnings) =
            self.introspect(&mut source, &cfg.plan).await?;
        for warning in intro_warnings {
            self.warn(&mut warnings, warning);
        }

        let options = self.resolve_ddl_options(&cfg.plan, &caps, &mut warnings);
        self.sink.emit(&TransferEvent::RunStarted {
            tables: descriptors.len(),
        });

        // Scoped switch: FK enforcement goes down for the whole run so that
        // cyclic and forward references cannot fail inserts, and comes back
        // up on every exit path.
        dest.set_foreign_keys(false).await?;
        let outcome = self
            .transfer_tables(&mut source, &mut dest, cfg, options, &descriptors, &mut warnings)
            .await;
        if let Err(err) = dest.set_foreign_keys(true).await {
            warn!("failed to re-enable foreign keys: {err:#}");
        }
        let (tables, total_rows) = match outcome {
            Ok(result) => result,
            Err(err) => {
                self.sink.emit(&TransferEvent::Error {
                    message: format!("{err:#}"),
                });
                return Err(err);
            }
        };

        if cfg.plan.options.vacuum {
            info!("Running VACUUM");
            dest.vacuum().await?;
        }

        self.sink.emit(&TransferEvent::RunFinished {
            tables: tables.len(),
            rows: total_rows,
        });

        Ok(TransferReport {
            sqlite_file: cfg.sqlite_file.clone(),
            sqlite_version: caps.version,
            tables,
            total_rows,
            warnings,
        })
    }

    // ─── Phases ──────────────────────────────────────────────────────────────

    /// Select and introspect the tables the plan covers, in stable name order.
    async fn introspect(
        &self,
        source: &mut MysqlClient,
        plan: &TransferPlan,
    ) -> Result<(Vec<TableDescriptor>, Vec<String>)> {
        let available = source.fetch_tables().await?;

        if let TableSelection::Include(names) = &plan.selection {
            for name in names {
                if !available.iter().any(|(n, _)| n == name) {
                    return Err(TransferError::InvalidPlan(format!(
                        "table `{name}` does not exist in the source database"
                    ))
                    .into());
                }
            }
        }

        let mut descriptors = Vec::new();
        let mut warnings = Vec::new();
        for (name, kind) in available {
            if !plan.selection.selects(&name) {
                continue;
            }
            if kind == TableKind::View && !plan.options.views_as_tables {
                if matches!(&plan.selection, TableSelection::Include(_)) {
                    warnings.push(format!(
                        "view `{name}` skipped (enable -T/--mysql-views-as-tables to materialize it)"
                    ));
                }
                continue;
            }
            let (descriptor, table_warnings) = source.introspect_table(&name, kind).await?;
            warnings.extend(table_warnings);
            descriptors.push(descriptor);
        }
        Ok((descriptors, warnings))
    }

    fn resolve_ddl_options(
        &self,
        plan: &TransferPlan,
        caps: &SqliteCaps,
        warnings: &mut Vec<String>,
    ) -> DdlOptions {
        if plan.options.strict && !caps.strict_tables_available {
            self.warn(
                warnings,
                format!(
                    "STRICT tables requested but SQLite {} predates 3.37; emitting plain tables",
                    caps.version
                ),
            );
        }

        let emit_foreign_keys = plan.foreign_keys_allowed();
        if plan.selection.is_subset() && !plan.options.without_foreign_keys {
            self.warn(
                warnings,
                "foreign keys suppressed: the table selection does not cover the whole database"
                    .to_string(),
            );
        }

        DdlOptions {
            strict: plan.options.strict && caps.strict_tables_available,
            collation: plan.options.collation,
            prefix_indices: plan.options.prefix_indices,
            emit_foreign_keys,
            type_options: TypeOptions {
                json1_available: caps.json1_available,
                json_as_text: plan.options.json_as_text,
            },
        }
    }

    async fn transfer_tables(
        &self,
        source: &mut MysqlClient,
        dest: &mut SqliteDest,
        cfg: &TransferConfig,
        options: DdlOptions,
        descriptors: &[TableDescriptor],
        warnings: &mut Vec<String>,
    ) -> Result<(Vec<TableReport>, u64)> {
        let plan = &cfg.plan;
        let mut emitter = DdlEmitter::new(options, descriptors);
        let mut reports = Vec::with_capacity(descriptors.len());
        let mut total_rows = 0u64;

        for table in descriptors {
            if !plan.options.without_tables {
                let ddl = match emitter.emit_table(table) {
                    Ok(ddl) => ddl,
                    Err(err) => {
                        reports.push(TableReport {
                            name: table.name.clone(),
                            rows: 0,
                            state: TableState::Failed,
                        });
                        return Err(err.into());
                    }
                };
                for warning in ddl.warnings {
                    self.warn(warnings, warning);
                }
                dest.execute(&ddl.create_table).await?;
                for statement in &ddl.create_indices {
                    dest.execute(statement).await?;
                }
                info!("Created table `{}`", table.name);
            }

            let mut rows = 0u64;
            if !plan.options.without_data {
                let mut streamer = RowStreamer {
                    source: &mut *source,
                    dest: &mut *dest,
                    sink: self.sink,
                };
                rows = match streamer.stream_table(table, &plan.options).await {
                    Ok(rows) => rows,
                    Err(err) => {
                        reports.push(TableReport {
                            name: table.name.clone(),
                            rows: 0,
                            state: TableState::Failed,
                        });
                        return Err(err);
                    }
                };
                info!("Transferred {} row(s) into `{}`", rows, table.name);
            }

            // `--without-data` (and the zero-row case) land here directly.
            total_rows += rows;
            reports.push(TableReport {
                name: table.name.clone(),
                rows,
                state: TableState::DataDone,
            });
        }

        Ok((reports, total_rows))
    }

    fn warn(&self, warnings: &mut Vec<String>, message: String) {
        self.sink.emit(&TransferEvent::Warning {
            message: message.clone(),
        });
        warnings.push(message);
    }
}
