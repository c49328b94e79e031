// ─────────────────────────────────────────────────────────────────────────────
// Ports
// ─────────────────────────────────────────────────────────────────────────────

/// Structured progress events the engine emits while running. The sink
/// decides what to do with them — log lines, a progress bar, nothing.
#[derive(Debug, Clone)]
pub enum TransferEvent {
    RunStarted {
        tables: usize,
    },
    TableStarted {
        table: String,
        /// Source row count when known (used to size progress bars);
        /// `None` when the count query was skipped.
        total_rows: Option<u64>,
    },
    ChunkCommitted {
        table: String,
        rows_done: u64,
    },
    TableDone {
        table: String,
        rows: u64,
    },
    Warning {
        message: String,
    },
    Error {
        message: String,
    },
    RunFinished {
        tables: usize,
        rows: u64,
    },
}

/// Port: progress/log sink (implemented by LogSink, ProgressBarSink).
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &TransferEvent);
}

/// A sink that discards everything. The library default for embedders that
/// only care about the returned report.
#[derive(Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: &TransferEvent) {}
}
