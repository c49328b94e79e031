use colored::*;
use tabled::settings::{object::Columns, Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::application::transfer::TransferReport;

#[derive(Tabled)]
struct TableRow {
    table: String,
    rows: String,
}

/// Print the end-of-run summary to stdout.
pub fn print_summary(report: &TransferReport) {
    println!();
    println!("{}", "TRANSFER COMPLETE".bold().cyan());
    println!(
        "→ {} (SQLite {})",
        report.sqlite_file.display().to_string().green(),
        report.sqlite_version
    );
    println!();

    if report.tables.is_empty() {
        println!("{}", "No tables matched the selection.".italic());
        return;
    }

    let rows: Vec<TableRow> = report
        .tables
        .iter()
        .map(|t| TableRow {
            table: t.name.bold().to_string(),
            rows: t.rows.to_string().green().to_string(),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..=1)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    println!(
        "  Total: {} row(s) across {} table(s)",
        report.total_rows.to_string().bold(),
        report.tables.len()
    );

    if !report.warnings.is_empty() {
        println!();
        println!(
            "{} {}",
            report.warnings.len().to_string().yellow().bold(),
            "warning(s):".yellow()
        );
        for warning in &report.warnings {
            println!("  {} {}", "•".yellow(), warning);
        }
    }
    println!();
}

#[derive(Tabled)]
struct VersionRow {
    component: String,
    version: String,
}

/// `--version`: engine and runtime versions as a small table.
pub fn print_version(sqlite_version: &str) {
    let rows = vec![
        VersionRow {
            component: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        VersionRow {
            component: "sqlite".to_string(),
            version: sqlite_version.to_string(),
        },
    ];
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
}
