use thiserror::Error;

/// Error kinds raised by the transfer engine.
///
/// Fatal kinds propagate to the orchestrator, which restores the SQLite
/// foreign-key switch and exits. Warnings are never errors — they travel
/// through the progress sink instead.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Invalid flag combination or table selection. Raised before any
    /// connection is opened.
    #[error("invalid transfer plan: {0}")]
    InvalidPlan(String),

    /// A MySQL declared type the translator does not know.
    #[error("table `{table}`, column `{column}`: unknown MySQL type `{declared}`")]
    UnknownType {
        table: String,
        column: String,
        declared: String,
    },

    /// The schema could be read but not translated.
    #[error("table `{table}`, column `{column}`: {message}")]
    SchemaTranslation {
        table: String,
        column: String,
        message: String,
    },

    /// A row value that cannot be represented as a SQLite bind value.
    #[error("table `{table}`, column `{column}`, row {row}: {message}")]
    DataConversion {
        table: String,
        column: String,
        row: u64,
        message: String,
    },

    /// A date/time string read back from SQLite that neither the ISO-8601
    /// parser nor the permissive fallback could make sense of.
    #[error("malformed date/time value `{0}`")]
    MalformedTemporal(String),
}

impl TransferError {
    pub fn data_conversion(
        table: &str,
        column: &str,
        row: u64,
        message: impl Into<String>,
    ) -> Self {
        Self::DataConversion {
            table: table.to_string(),
            column: column.to_string(),
            row,
            message: message.into(),
        }
    }
}
