use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

use mysql2sqlite::infrastructure::db::sqlite::SqliteDest;
use mysql2sqlite::presentation::progress::ProgressBarSink;
use mysql2sqlite::presentation::summary::{print_summary, print_version};
use mysql2sqlite::{
    Collation, CompositeSink, LogLevel, LogSink, MysqlConfig, ProgressSink, TransferConfig,
    TransferOptions, TransferPlan,
};

#[derive(Parser, Debug)]
#[command(
    name = "mysql2sqlite",
    about = "Transfer a MySQL/MariaDB database into a single SQLite file.",
    // -h is the MySQL host, as mysql(1) users expect; help stays on --help.
    disable_help_flag = true
)]
struct Cli {
    /// Output SQLite file path (created if missing).
    #[arg(short = 'f', long = "sqlite-file", required_unless_present = "version")]
    sqlite_file: Option<PathBuf>,

    /// Source database name.
    #[arg(short = 'd', long = "mysql-database", required_unless_present = "version")]
    mysql_database: Option<String>,

    /// Source user.
    #[arg(short = 'u', long = "mysql-user", required_unless_present = "version")]
    mysql_user: Option<String>,

    /// Source password. Prefer -p to be prompted instead of putting the
    /// password into the shell history.
    #[arg(long = "mysql-password")]
    mysql_password: Option<String>,

    /// Prompt for the source password.
    #[arg(
        short = 'p',
        long = "prompt-mysql-password",
        conflicts_with = "mysql_password"
    )]
    prompt_mysql_password: bool,

    /// Source host.
    #[arg(short = 'h', long = "mysql-host", default_value = "localhost")]
    mysql_host: String,

    /// Source port.
    #[arg(short = 'P', long = "mysql-port", default_value_t = 3306)]
    mysql_port: u16,

    /// Session character set.
    #[arg(long = "mysql-charset", default_value = "utf8mb4")]
    mysql_charset: String,

    /// Session collation (server default when unset).
    #[arg(long = "mysql-collation")]
    mysql_collation: Option<String>,

    /// Disable TLS to the source.
    #[arg(short = 'S', long = "skip-ssl")]
    skip_ssl: bool,

    /// Transfer only these tables (implies no foreign keys).
    #[arg(short = 't', long = "mysql-tables", num_args = 1.., value_name = "NAME")]
    mysql_tables: Vec<String>,

    /// Transfer everything except these tables (implies no foreign keys).
    #[arg(
        short = 'e',
        long = "exclude-mysql-tables",
        num_args = 1..,
        value_name = "NAME",
        conflicts_with = "mysql_tables"
    )]
    exclude_mysql_tables: Vec<String>,

    /// Materialize views as regular tables.
    #[arg(short = 'T', long = "mysql-views-as-tables")]
    views_as_tables: bool,

    /// Per-table row cap.
    #[arg(short = 'L', long = "limit-rows", value_name = "N")]
    limit_rows: Option<u64>,

    /// Collation applied to TEXT-affine columns.
    #[arg(short = 'C', long = "collation", value_enum, default_value_t = Collation::Binary)]
    collation: Collation,

    /// Prefix all index names with <table>_.
    #[arg(short = 'K', long = "prefix-indices")]
    prefix_indices: bool,

    /// Suppress foreign keys.
    #[arg(short = 'X', long = "without-foreign-keys")]
    without_foreign_keys: bool,

    /// Suppress DDL — stream data into an existing schema.
    #[arg(short = 'Z', long = "without-tables")]
    without_tables: bool,

    /// Suppress data — emit DDL only.
    #[arg(short = 'W', long = "without-data", conflicts_with = "without_tables")]
    without_data: bool,

    /// Emit STRICT tables when the destination supports them.
    #[arg(short = 'M', long = "strict")]
    strict: bool,

    /// Rows per fetch/commit batch.
    #[arg(short = 'c', long = "chunk", value_name = "N")]
    chunk: Option<usize>,

    /// Store JSON columns as plain TEXT even when JSON1 is available.
    #[arg(long = "json-as-text")]
    json_as_text: bool,

    /// Run VACUUM after the last table.
    #[arg(short = 'V', long = "vacuum")]
    vacuum: bool,

    /// Read each resultset fully client-side before writing.
    #[arg(long = "use-buffered-cursors")]
    use_buffered_cursors: bool,

    /// Log file path (receives all levels, regardless of -q).
    #[arg(short = 'l', long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Quiet: errors only.
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Propagate unexpected errors with their full chain.
    #[arg(long)]
    debug: bool,

    /// Print engine and runtime versions and exit.
    #[arg(long)]
    version: bool,

    /// Print help.
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        print_version(&sqlite_runtime_version().await);
        return ExitCode::SUCCESS;
    }

    let level = if cli.quiet {
        LogLevel::Error
    } else if cli.debug {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    if let Err(err) = mysql2sqlite::init_tracing(level, cli.log_file.as_deref()) {
        eprintln!("Failed to initialise logging: {err:#}");
        return ExitCode::FAILURE;
    }

    let debug = cli.debug;
    match run_cli(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if debug {
                eprintln!("Error: {err:?}");
            } else {
                eprintln!("Error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run_cli(cli: Cli) -> Result<()> {
    let password = if cli.prompt_mysql_password {
        Some(rpassword::prompt_password("MySQL password: ").context("Failed to read password")?)
    } else {
        cli.mysql_password.clone()
    };

    let options = TransferOptions {
        without_tables: cli.without_tables,
        without_data: cli.without_data,
        views_as_tables: cli.views_as_tables,
        without_foreign_keys: cli.without_foreign_keys,
        prefix_indices: cli.prefix_indices,
        strict: cli.strict,
        json_as_text: cli.json_as_text,
        collation: cli.collation,
        vacuum: cli.vacuum,
        buffered: cli.use_buffered_cursors,
        chunk: cli.chunk,
        limit_rows: cli.limit_rows,
    };
    let plan = TransferPlan::new(cli.mysql_tables, cli.exclude_mysql_tables, options)?;

    let cfg = TransferConfig {
        mysql: MysqlConfig {
            host: cli.mysql_host,
            port: cli.mysql_port,
            database: cli
                .mysql_database
                .context("missing -d/--mysql-database")?,
            user: cli.mysql_user.context("missing -u/--mysql-user")?,
            password,
            charset: cli.mysql_charset,
            collation: cli.mysql_collation,
            skip_ssl: cli.skip_ssl,
        },
        sqlite_file: cli.sqlite_file.context("missing -f/--sqlite-file")?,
        plan,
    };

    let sink: Box<dyn ProgressSink> = if cli.quiet {
        Box::new(LogSink)
    } else {
        Box::new(CompositeSink::new(vec![
            Box::new(LogSink),
            Box::new(ProgressBarSink::new()),
        ]))
    };

    let report = mysql2sqlite::run(&cfg, sink.as_ref()).await?;

    if !cli.quiet {
        print_summary(&report);
    }
    Ok(())
}

/// The SQLite library version, read from a throwaway in-memory connection.
async fn sqlite_runtime_version() -> String {
    async {
        let mut dest = SqliteDest::connect_in_memory().await?;
        Ok::<_, anyhow::Error>(dest.probe_capabilities().await?.version)
    }
    .await
    .unwrap_or_else(|_| "unknown".to_string())
}
