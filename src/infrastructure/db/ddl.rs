use std::collections::HashSet;

use crate::domain::defaults::{translate_default, DefaultClause};
use crate::domain::descriptors::{
    ColumnDescriptor, IndexDescriptor, IndexKind, TableDescriptor,
};
use crate::domain::error::TransferError;
use crate::domain::sqlite_type::{translate_type, Collation, SqliteType, TypeOptions};

// ─────────────────────────────────────────────────────────────────────────────
// DDL emission
// ─────────────────────────────────────────────────────────────────────────────

/// Destination-side switches the emitter honours, resolved against the
/// capability probe (`strict` is already `requested AND supported`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DdlOptions {
    pub strict: bool,
    pub collation: Collation,
    pub prefix_indices: bool,
    pub emit_foreign_keys: bool,
    pub type_options: TypeOptions,
}

/// The statements for one table: exactly one CREATE TABLE, then zero or more
/// CREATE INDEX. Warnings describe what was dropped on the way.
#[derive(Debug, Clone)]
pub struct TableDdl {
    pub create_table: String,
    pub create_indices: Vec<String>,
    pub warnings: Vec<String>,
}

/// Emits DDL for a set of tables while keeping index names unique across the
/// whole output database — MySQL scopes index names per table, SQLite per
/// database, so names are resolved through a shared registry.
pub struct DdlEmitter {
    options: DdlOptions,
    table_names: HashSet<String>,
    used_index_names: HashSet<String>,
}

impl DdlEmitter {
    /// `tables` must be the full set the run will emit; the emitter needs
    /// every table name up front to detect index/table name collisions.
    pub fn new(options: DdlOptions, tables: &[TableDescriptor]) -> Self {
        Self {
            options,
            table_names: tables.iter().map(|t| t.name.clone()).collect(),
            used_index_names: HashSet::new(),
        }
    }

    pub fn emit_table(&mut self, table: &TableDescriptor) -> Result<TableDdl, TransferError> {
        check_descriptor_closure(table)?;

        let mut warnings = Vec::new();
        let strict = self.options.strict;

        // A single-column auto-increment primary key collapses into
        // `INTEGER PRIMARY KEY AUTOINCREMENT` when its translated type is
        // integer-affine; the table-level PRIMARY KEY clause is then omitted.
        let collapsed_pk = table.sole_auto_increment_pk().and_then(|col| {
            let ty = translate_type(&col.source_type, &self.options.type_options);
            (ty == SqliteType::Integer).then(|| col.name.clone())
        });

        let mut defs: Vec<String> = Vec::with_capacity(table.columns.len() + 4);
        for col in &table.columns {
            defs.push(self.column_def(table, col, collapsed_pk.as_deref(), &mut warnings));
        }

        if collapsed_pk.is_none() && !table.primary_key.is_empty() {
            defs.push(format!(
                "PRIMARY KEY ({})",
                quote_list(&table.primary_key)
            ));
        }

        // Single-column uniques stay inline; wider ones become indices below.
        for idx in &table.indices {
            if idx.kind == IndexKind::Unique && idx.columns.len() == 1 {
                defs.push(format!("UNIQUE ({})", quote_ident(&idx.columns[0].name)));
            }
        }

        if self.options.emit_foreign_keys {
            for fk in &table.foreign_keys {
                defs.push(format!(
                    "FOREIGN KEY ({}) REFERENCES {} ({}) ON UPDATE {} ON DELETE {}",
                    quote_list(&fk.columns),
                    quote_ident(&fk.referenced_table),
                    quote_list(&fk.referenced_columns),
                    fk.on_update.as_sql(),
                    fk.on_delete.as_sql(),
                ));
            }
        }

        let suffix = if strict { " STRICT" } else { "" };
        let create_table = format!(
            "CREATE TABLE IF NOT EXISTS {} ({}){}",
            quote_ident(&table.name),
            defs.join(", "),
            suffix
        );

        let create_indices = self.index_statements(table, &mut warnings);

        Ok(TableDdl {
            create_table,
            create_indices,
            warnings,
        })
    }

    fn column_def(
        &self,
        table: &TableDescriptor,
        col: &ColumnDescriptor,
        collapsed_pk: Option<&str>,
        warnings: &mut Vec<String>,
    ) -> String {
        let ty = translate_type(&col.source_type, &self.options.type_options);

        if col.source_type.is_spatial() {
            warnings.push(format!(
                "table `{}`, column `{}`: spatial type `{}` stored as BLOB",
                table.name, col.name, col.declared_type
            ));
        }

        if collapsed_pk == Some(col.name.as_str()) {
            return format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quote_ident(&col.name));
        }

        if col.auto_increment && ty != SqliteType::Integer {
            warnings.push(format!(
                "table `{}`, column `{}`: auto_increment on non-integer type `{}` emitted as a plain column",
                table.name, col.name, col.declared_type
            ));
        }

        let mut def = format!("{} {}", quote_ident(&col.name), ty.render(self.options.strict));

        if ty.is_text_affine() && self.options.collation != Collation::Binary {
            def.push_str(" COLLATE ");
            def.push_str(self.options.collation.as_sql());
        }

        if !col.nullable {
            def.push_str(" NOT NULL");
        }

        match translate_default(col.default.as_deref(), col.nullable, col.generated) {
            DefaultClause::Omit => {}
            DefaultClause::Null => def.push_str(" DEFAULT NULL"),
            DefaultClause::Verbatim(rendered) => {
                def.push_str(" DEFAULT ");
                def.push_str(&rendered);
            }
            DefaultClause::Dropped { expression } => {
                warnings.push(format!(
                    "table `{}`, column `{}`: expression default `{}` dropped",
                    table.name, col.name, expression
                ));
            }
        }

        def
    }

    fn index_statements(
        &mut self,
        table: &TableDescriptor,
        warnings: &mut Vec<String>,
    ) -> Vec<String> {
        let mut statements = Vec::new();
        for idx in &table.indices {
            match idx.kind {
                IndexKind::Primary => continue,
                // Inlined in the CREATE TABLE.
                IndexKind::Unique if idx.columns.len() == 1 => continue,
                IndexKind::FullText => {
                    warnings.push(format!(
                        "table `{}`: FULLTEXT index `{}` dropped",
                        table.name, idx.name
                    ));
                    continue;
                }
                IndexKind::Spatial => {
                    warnings.push(format!(
                        "table `{}`: SPATIAL index `{}` dropped",
                        table.name, idx.name
                    ));
                    continue;
                }
                IndexKind::Unique | IndexKind::NonUnique => {}
            }

            let name = self.resolve_index_name(&table.name, idx);
            let unique = if idx.kind == IndexKind::Unique {
                "UNIQUE "
            } else {
                ""
            };
            let cols: Vec<String> = idx
                .columns
                .iter()
                .map(|c| quote_ident(&c.name))
                .collect();
            statements.push(format!(
                "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
                unique,
                quote_ident(&name),
                quote_ident(&table.name),
                cols.join(", ")
            ));
        }
        statements
    }

    /// Index-name policy: SQLite index names share the table namespace and
    /// are database-global. An unnamed index becomes `<table>_<cols…>`;
    /// a name that was requested prefixed, already used, or shadowing a
    /// table name becomes `<table>_<name>`; a collision surviving that gains
    /// a numeric suffix.
    fn resolve_index_name(&mut self, table: &str, idx: &IndexDescriptor) -> String {
        let base = if idx.name.is_empty() {
            let cols: Vec<&str> = idx.columns.iter().map(|c| c.name.as_str()).collect();
            format!("{}_{}", table, cols.join("_"))
        } else if self.options.prefix_indices || self.is_taken(&idx.name) {
            format!("{}_{}", table, idx.name)
        } else {
            idx.name.clone()
        };

        let mut candidate = base.clone();
        let mut counter = 2;
        while self.is_taken(&candidate) {
            candidate = format!("{base}_{counter}");
            counter += 1;
        }
        self.used_index_names.insert(candidate.clone());
        candidate
    }

    fn is_taken(&self, name: &str) -> bool {
        self.used_index_names.contains(name) || self.table_names.contains(name)
    }
}

/// §3 invariant: every column an index or foreign key references must exist
/// in the owning table's column list.
fn check_descriptor_closure(table: &TableDescriptor) -> Result<(), TransferError> {
    for idx in &table.indices {
        for col in &idx.columns {
            if table.column(&col.name).is_none() {
                return Err(TransferError::SchemaTranslation {
                    table: table.name.clone(),
                    column: col.name.clone(),
                    message: format!("index `{}` references a column not in the table", idx.name),
                });
            }
        }
    }
    for fk in &table.foreign_keys {
        for col in &fk.columns {
            if table.column(col).is_none() {
                return Err(TransferError::SchemaTranslation {
                    table: table.name.clone(),
                    column: col.clone(),
                    message: format!(
                        "foreign key `{}` references a column not in the table",
                        fk.name
                    ),
                });
            }
        }
    }
    Ok(())
}

// ─── Identifier quoting ───────────────────────────────────────────────────────

/// Double-quote an identifier for SQLite, doubling internal quotes.
pub fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn quote_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| quote_ident(n))
        .collect::<Vec<_>>()
        .join(", ")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
