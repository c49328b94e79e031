use tracing::{debug, error, info, warn};

use crate::domain::ports::{ProgressSink, TransferEvent};

// ─────────────────────────────────────────────────────────────────────────────
// Sinks
// ─────────────────────────────────────────────────────────────────────────────

/// Routes every event into `tracing`, which carries it to the console and/or
/// the log file depending on how the subscriber was initialised.
#[derive(Debug, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&self, event: &TransferEvent) {
        match event {
            TransferEvent::RunStarted { tables } => {
                info!("Transferring {tables} table(s)");
            }
            TransferEvent::TableStarted { table, total_rows } => match total_rows {
                Some(total) => info!("Table `{table}`: {total} row(s) to transfer"),
                None => info!("Table `{table}`: starting transfer"),
            },
            TransferEvent::ChunkCommitted { table, rows_done } => {
                debug!("Table `{table}`: {rows_done} row(s) committed");
            }
            TransferEvent::TableDone { table, rows } => {
                info!("Table `{table}`: done ({rows} row(s))");
            }
            TransferEvent::Warning { message } => warn!("{message}"),
            TransferEvent::Error { message } => error!("{message}"),
            TransferEvent::RunFinished { tables, rows } => {
                info!("Finished: {tables} table(s), {rows} row(s)");
            }
        }
    }
}

/// Fan an event out to several sinks (log file + progress bar, typically).
pub struct CompositeSink {
    sinks: Vec<Box<dyn ProgressSink>>,
}

impl CompositeSink {
    pub fn new(sinks: Vec<Box<dyn ProgressSink>>) -> Self {
        Self { sinks }
    }
}

impl ProgressSink for CompositeSink {
    fn emit(&self, event: &TransferEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Progress bar (CLI only)
// ─────────────────────────────────────────────────────────────────────────────

/// One `indicatif` bar per table, driven by the chunk events. The engine is
/// serial, so a single active bar at a time is all there ever is.
#[cfg(feature = "cli")]
pub struct ProgressBarSink {
    current: std::sync::Mutex<Option<indicatif::ProgressBar>>,
}

#[cfg(feature = "cli")]
impl ProgressBarSink {
    pub fn new() -> Self {
        Self {
            current: std::sync::Mutex::new(None),
        }
    }

    fn bar_for(&self, table: &str, total: Option<u64>) -> indicatif::ProgressBar {
        use indicatif::{ProgressBar, ProgressStyle};
        let bar = match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                bar.set_style(
                    ProgressStyle::with_template(
                        "{prefix:>20} [{bar:40}] {pos}/{len} ({eta})",
                    )
                    .unwrap()
                    .progress_chars("=> "),
                );
                bar
            }
            None => ProgressBar::new_spinner(),
        };
        bar.set_prefix(table.to_string());
        bar
    }
}

#[cfg(feature = "cli")]
impl Default for ProgressBarSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "cli")]
impl ProgressSink for ProgressBarSink {
    fn emit(&self, event: &TransferEvent) {
        let mut current = self.current.lock().unwrap();
        match event {
            TransferEvent::TableStarted { table, total_rows } => {
                *current = Some(self.bar_for(table, *total_rows));
            }
            TransferEvent::ChunkCommitted { rows_done, .. } => {
                if let Some(bar) = current.as_ref() {
                    bar.set_position(*rows_done);
                }
            }
            TransferEvent::TableDone { .. } => {
                if let Some(bar) = current.take() {
                    bar.finish_and_clear();
                }
            }
            TransferEvent::Error { .. } => {
                if let Some(bar) = current.take() {
                    bar.abandon();
                }
            }
            _ => {}
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSink(Arc<AtomicUsize>);

    impl ProgressSink for CountingSink {
        fn emit(&self, _event: &TransferEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_composite_fans_out() {
        let count = Arc::new(AtomicUsize::new(0));
        let composite = CompositeSink::new(vec![
            Box::new(CountingSink(Arc::clone(&count))),
            Box::new(CountingSink(Arc::clone(&count))),
        ]);
        composite.emit(&TransferEvent::RunStarted { tables: 1 });
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
