use crate::domain::error::TransferError;
use crate::domain::sqlite_type::Collation;

// ─────────────────────────────────────────────────────────────────────────────
// Transfer plan
// ─────────────────────────────────────────────────────────────────────────────

/// Which source tables the run covers. Include and exclude lists are
/// mutually exclusive — mixing them is rejected at validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TableSelection {
    #[default]
    All,
    Include(Vec<String>),
    Exclude(Vec<String>),
}

impl TableSelection {
    pub fn is_subset(&self) -> bool {
        !matches!(self, TableSelection::All)
    }

    /// Whether a table named `name` falls inside the selection.
    pub fn selects(&self, name: &str) -> bool {
        match self {
            TableSelection::All => true,
            TableSelection::Include(names) => names.iter().any(|n| n == name),
            TableSelection::Exclude(names) => !names.iter().any(|n| n == name),
        }
    }
}

/// The §6 flag surface resolved to concrete values.
#[derive(Debug, Clone, Default)]
pub struct TransferOptions {
    /// `-Z`: assume the destination schema exists, stream data only.
    pub without_tables: bool,
    /// `-W`: emit DDL only.
    pub without_data: bool,
    /// `-T`: materialize views as regular tables.
    pub views_as_tables: bool,
    /// `-X`: never emit foreign keys.
    pub without_foreign_keys: bool,
    /// `-K`: prefix every index name with `<table>_`.
    pub prefix_indices: bool,
    /// `-M`: emit STRICT tables when the destination supports them.
    pub strict: bool,
    /// `--json-as-text`.
    pub json_as_text: bool,
    /// `-C`: collation for TEXT-affine columns.
    pub collation: Collation,
    /// `-V`: run VACUUM after the last table.
    pub vacuum: bool,
    /// `--use-buffered-cursors`: read each resultset fully before writing.
    pub buffered: bool,
    /// `-c N`: rows per fetch/commit batch.
    pub chunk: Option<usize>,
    /// `-L N`: per-table row cap.
    pub limit_rows: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct TransferPlan {
    pub selection: TableSelection,
    pub options: TransferOptions,
}

impl TransferPlan {
    /// Build a plan from the raw include/exclude lists. Fails fast on the
    /// flag combinations §6 forbids, before any connection is opened.
    pub fn new(
        include: Vec<String>,
        exclude: Vec<String>,
        options: TransferOptions,
    ) -> Result<Self, TransferError> {
        let selection = match (include.is_empty(), exclude.is_empty()) {
            (false, false) => {
                return Err(TransferError::InvalidPlan(
                    "-t/--mysql-tables and -e/--exclude-mysql-tables are mutually exclusive"
                        .to_string(),
                ))
            }
            (false, true) => TableSelection::Include(include),
            (true, false) => TableSelection::Exclude(exclude),
            (true, true) => TableSelection::All,
        };
        let plan = Self { selection, options };
        plan.validate()?;
        Ok(plan)
    }

    pub fn validate(&self) -> Result<(), TransferError> {
        if self.options.without_tables && self.options.without_data {
            return Err(TransferError::InvalidPlan(
                "-Z/--without-tables and -W/--without-data are mutually exclusive".to_string(),
            ));
        }
        if self.options.chunk == Some(0) {
            return Err(TransferError::InvalidPlan(
                "-c/--chunk must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Foreign keys are emitted only when the plan covers every table and
    /// suppression was not requested. Any subset silently breaks referential
    /// closure, so FK emission is withheld wholesale.
    pub fn foreign_keys_allowed(&self) -> bool {
        !self.selection.is_subset() && !self.options.without_foreign_keys
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_and_exclude_rejected() {
        let err = TransferPlan::new(
            vec!["users".into()],
            vec!["orders".into()],
            TransferOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn test_without_tables_and_without_data_rejected() {
        let options = TransferOptions {
            without_tables: true,
            without_data: true,
            ..Default::default()
        };
        assert!(TransferPlan::new(vec![], vec![], options).is_err());
    }

    #[test]
    fn test_zero_chunk_rejected() {
        let options = TransferOptions {
            chunk: Some(0),
            ..Default::default()
        };
        assert!(TransferPlan::new(vec![], vec![], options).is_err());
    }

    #[test]
    fn test_selection_semantics() {
        let all = TableSelection::All;
        assert!(all.selects("anything"));
        assert!(!all.is_subset());

        let include = TableSelection::Include(vec!["users".into()]);
        assert!(include.selects("users"));
        assert!(!include.selects("orders"));
        assert!(include.is_subset());

        let exclude = TableSelection::Exclude(vec!["logs".into()]);
        assert!(exclude.selects("users"));
        assert!(!exclude.selects("logs"));
        assert!(exclude.is_subset());
    }

    #[test]
    fn test_subset_suppresses_foreign_keys() {
        let full = TransferPlan::new(vec![], vec![], TransferOptions::default()).unwrap();
        assert!(full.foreign_keys_allowed());

        let subset =
            TransferPlan::new(vec!["users".into()], vec![], TransferOptions::default()).unwrap();
        assert!(!subset.foreign_keys_allowed());

        let suppressed = TransferPlan::new(
            vec![],
            vec![],
            TransferOptions {
                without_foreign_keys: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(!suppressed.foreign_keys_allowed());
    }
}
