// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;

use crate::core::naming::BINARY_NAME;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// 出力フォーマット
#[derive(Clone, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Structured JSON output
    Json,
}

/// Strata Sheets - Spreadsheet to Database Migration CLI
///
/// Loads every sheet of an Excel workbook into its own database table,
/// inferring a column type for each header.
#[derive(Parser, Debug)]
#[command(name = BINARY_NAME)]
#[command(author = "Strata Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Spreadsheet to database migration CLI tool")]
#[command(long_about = "Strata Sheets - Spreadsheet to Database Migration CLI

Loads every sheet of an .xlsx/.xlsm workbook into its own table.

Strata Sheets helps you:
  • Infer a storage type for each column from its values
  • Override inferred types per column in the config file
  • Replace destination tables on every run, so reruns converge
  • Verify row counts after the load

Supported databases: PostgreSQL, MySQL, SQLite")]
#[command(propagate_version = true)]
#[command(after_help = "GETTING STARTED:
  1. Write a config template:       strata-sheets init --dialect mysql --source survey.xlsx
  2. Preview inferred schemas:      strata-sheets inspect
  3. Migrate every sheet:           strata-sheets migrate
  4. Check the destination tables:  strata-sheets verify

For detailed help on each command, use: strata-sheets <command> --help")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a configuration template
    ///
    /// EXAMPLES:
    ///   # MySQL destination (default)
    ///   strata-sheets init --source survey.xlsx
    ///
    ///   # SQLite destination
    ///   strata-sheets init --dialect sqlite --database survey.db
    Init {
        /// Database dialect (postgresql, mysql, sqlite)
        #[arg(short, long, value_name = "DIALECT", default_value = "mysql")]
        dialect: String,

        /// Source workbook path
        #[arg(short, long, value_name = "PATH")]
        source: Option<PathBuf>,

        /// Database name (file path for SQLite)
        #[arg(long, value_name = "NAME")]
        database: Option<String>,

        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Migrate every sheet of the workbook
    ///
    /// Each sheet is loaded into a freshly created table. A sheet that fails
    /// is reported and the remaining sheets are still migrated.
    ///
    /// EXAMPLES:
    ///   strata-sheets migrate
    ///   strata-sheets migrate --file exports/2024.xlsx --batch-size 500
    Migrate {
        /// Workbook path (overrides `source` in the config file)
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Rows per insert transaction
        #[arg(long, value_name = "ROWS")]
        batch_size: Option<usize>,

        /// Connection timeout in seconds
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
    },

    /// Show the schemas a migration would create, without a database
    ///
    /// EXAMPLES:
    ///   strata-sheets inspect
    ///   strata-sheets inspect --file survey.xlsx --format json
    Inspect {
        /// Workbook path (overrides `source` in the config file)
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,
    },

    /// List destination tables and their row counts
    Verify {
        /// Connection timeout in seconds
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
    },
}
