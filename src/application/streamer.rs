use anyhow::Result;
use futures_util::TryStreamExt;
use tracing::{debug, warn};

use crate::domain::descriptors::TableDescriptor;
use crate::domain::plan::TransferOptions;
use crate::domain::ports::{ProgressSink, TransferEvent};
use crate::infrastructure::db::mysql::{is_connection_lost, select_sql, MysqlClient};
use crate::infrastructure::db::sqlite::{insert_sql, SqliteDest};
use crate::infrastructure::db::value_adapter::decode_row;

/// Rows per INSERT batch in unchunked mode. Chunked mode (`-c N`) uses N.
const DEFAULT_FLUSH_SIZE: usize = 200;

// ─────────────────────────────────────────────────────────────────────────────
// Row streamer
// ─────────────────────────────────────────────────────────────────────────────

/// Moves one table's rows from MySQL to SQLite in bounded batches, with the
/// reconnect-once policy on transient source loss. Owns neither connection —
/// the orchestrator lends both for the duration of a table.
pub struct RowStreamer<'a> {
    pub source: &'a mut MysqlClient,
    pub dest: &'a mut SqliteDest,
    pub sink: &'a dyn ProgressSink,
}

/// Where a copy attempt failed. Only source-side errors are candidates for
/// the reconnect; everything else is fatal as-is.
enum CopyError {
    Source(sqlx::Error),
    Other(anyhow::Error),
}

impl RowStreamer<'_> {
    /// Stream one table. Returns the number of rows written.
    pub async fn stream_table(
        &mut self,
        table: &TableDescriptor,
        options: &TransferOptions,
    ) -> Result<u64> {
        let total = self
            .source
            .count_rows(&table.name, options.limit_rows)
            .await?;
        self.sink.emit(&TransferEvent::TableStarted {
            table: table.name.clone(),
            total_rows: Some(total),
        });

        if total == 0 {
            self.sink.emit(&TransferEvent::TableDone {
                table: table.name.clone(),
                rows: 0,
            });
            return Ok(0);
        }

        // Reconnect is a counter, not a loop: one transient loss per table is
        // tolerated, a second is fatal. The table restarts from the top after
        // a reconnect — INSERT OR IGNORE makes the replay harmless.
        let mut reconnected = false;
        let rows = loop {
            match self.copy_rows(table, options).await {
                Ok(rows) => break rows,
                Err(CopyError::Source(err)) if is_connection_lost(&err) && !reconnected => {
                    reconnected = true;
                    warn!(
                        "connection lost while reading `{}` ({err}); reconnecting once",
                        table.name
                    );
                    self.sink.emit(&TransferEvent::Warning {
                        message: format!(
                            "connection lost while reading `{}`; reconnecting once",
                            table.name
                        ),
                    });
                    self.source.reconnect().await?;
                }
                Err(CopyError::Source(err)) => {
                    return Err(anyhow::Error::new(err)
                        .context(format!("table `{}`: reading from MySQL failed", table.name)))
                }
                Err(CopyError::Other(err)) => return Err(err),
            }
        };

        self.sink.emit(&TransferEvent::TableDone {
            table: table.name.clone(),
            rows,
        });
        Ok(rows)
    }

    async fn copy_rows(
        &mut self,
        table: &TableDescriptor,
        options: &TransferOptions,
    ) -> Result<u64, CopyError> {
        // Reborrow the two ends separately so the source cursor can stay open
        // while batches go out to the destination.
        let source = &mut *self.source;
        let dest = &mut *self.dest;
        let sink = self.sink;

        let select = select_sql(table, options.limit_rows);
        let insert = insert_sql(&table.name, table.columns.len());
        let flush = options.chunk.unwrap_or(DEFAULT_FLUSH_SIZE);
        debug!("Executing: {}", select);

        let mut written = 0u64;
        let mut batch: Vec<_> = Vec::with_capacity(flush);

        if options.buffered {
            // Whole resultset client-side, then batched writes.
            let rows = sqlx::query(&select)
                .fetch_all(source.conn_mut())
                .await
                .map_err(CopyError::Source)?;
            for row in &rows {
                let ordinal = written + batch.len() as u64;
                batch.push(decode_row(row, table, ordinal).map_err(anyhow_copy)?);
                if batch.len() >= flush {
                    written = flush_batch(dest, sink, table, &insert, &mut batch, written).await?;
                }
            }
        } else {
            // Streaming cursor: rows arrive one at a time, memory stays
            // bounded by the flush size.
            let mut stream = sqlx::query(&select).fetch(source.conn_mut());
            while let Some(row) = stream.try_next().await.map_err(CopyError::Source)? {
                let ordinal = written + batch.len() as u64;
                batch.push(decode_row(&row, table, ordinal).map_err(anyhow_copy)?);
                if batch.len() >= flush {
                    written = flush_batch(dest, sink, table, &insert, &mut batch, written).await?;
                }
            }
        }

        if !batch.is_empty() {
            written = flush_batch(dest, sink, table, &insert, &mut batch, written).await?;
        }
        Ok(written)
    }
}

async fn flush_batch(
    dest: &mut SqliteDest,
    sink: &dyn ProgressSink,
    table: &TableDescriptor,
    insert: &str,
    batch: &mut Vec<Vec<crate::domain::value::SqliteValue>>,
    written: u64,
) -> Result<u64, CopyError> {
    dest.insert_batch(insert, batch)
        .await
        .map_err(CopyError::Other)?;
    let written = written + batch.len() as u64;
    batch.clear();
    sink.emit(&TransferEvent::ChunkCommitted {
        table: table.name.clone(),
        rows_done: written,
    });
    Ok(written)
}

fn anyhow_copy(err: crate::domain::error::TransferError) -> CopyError {
    CopyError::Other(err.into())
}
