use crate::domain::source_type::SourceType;

// ─────────────────────────────────────────────────────────────────────────────
// Introspected schema model
// ─────────────────────────────────────────────────────────────────────────────
//
// Built once per run by the introspector, consumed by the DDL emitter and the
// row streamer, discarded when the run ends. Nothing here writes back to MySQL.

/// One column as reported by `information_schema.columns`.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Raw `COLUMN_TYPE`, kept for error messages.
    pub declared_type: String,
    pub source_type: SourceType,
    pub nullable: bool,
    /// Raw `COLUMN_DEFAULT`, untranslated.
    pub default: Option<String>,
    pub auto_increment: bool,
    /// `EXTRA` carried an `on update CURRENT_TIMESTAMP` clause. Informational
    /// only; SQLite has no column-level equivalent and the clause is dropped.
    pub on_update_clause: bool,
    /// `EXTRA` marked the column `GENERATED ALWAYS AS (...)`.
    pub generated: bool,
    pub charset: Option<String>,
    pub collation: Option<String>,
}

/// One column reference inside an index, with the optional MySQL prefix
/// length (`KEY (name(10))`). The prefix is ignored when emitting — SQLite
/// indexes whole columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    pub name: String,
    pub prefix_len: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Primary,
    Unique,
    NonUnique,
    /// Dropped with a warning — SQLite's FTS is a virtual-table mechanism,
    /// not an index kind.
    FullText,
    /// Dropped with a warning — no R*Tree equivalent is emitted.
    Spatial,
}

#[derive(Debug, Clone)]
pub struct IndexDescriptor {
    /// Source name; `PRIMARY` denotes the primary key.
    pub name: String,
    pub columns: Vec<IndexColumn>,
    pub kind: IndexKind,
}

impl IndexDescriptor {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Referential action on a foreign key, as reported by
/// `information_schema.referential_constraints`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefAction {
    Restrict,
    Cascade,
    SetNull,
    #[default]
    NoAction,
    SetDefault,
}

impl RefAction {
    pub fn parse(rule: &str) -> Self {
        match rule.to_uppercase().as_str() {
            "RESTRICT" => Self::Restrict,
            "CASCADE" => Self::Cascade,
            "SET NULL" => Self::SetNull,
            "SET DEFAULT" => Self::SetDefault,
            _ => Self::NoAction,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::NoAction => "NO ACTION",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForeignKeyDescriptor {
    pub name: String,
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    pub on_update: RefAction,
    pub on_delete: RefAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    BaseTable,
    View,
}

#[derive(Debug, Clone)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    /// Primary-key column names in key order. Empty when the table has none.
    pub primary_key: Vec<String>,
    pub indices: Vec<IndexDescriptor>,
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
    pub kind: TableKind,
}

impl TableDescriptor {
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// The single auto-increment primary-key column eligible for the
    /// `INTEGER PRIMARY KEY AUTOINCREMENT` collapse, if any. The integer
    /// requirement is checked by the emitter against the translated type.
    pub fn sole_auto_increment_pk(&self) -> Option<&ColumnDescriptor> {
        if self.primary_key.len() != 1 {
            return None;
        }
        self.column(&self.primary_key[0])
            .filter(|c| c.auto_increment)
    }
}
