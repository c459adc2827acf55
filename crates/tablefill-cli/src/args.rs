use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use tablefill_core::ValueKind;

#[derive(Parser, Debug)]
#[command(
    name = "tablefill",
    about = "Fill a MySQL table with mock rows using batched INSERTs",
    version,
    after_help = "Examples:\n  tablefill columns --table users\n  tablefill preview --table-profile users-default --rows 10\n  tablefill insert --input job.json --batch-size 500\n  tablefill lists --value-type string\n  tablefill ping --profile staging"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory containing tablefill.toml
    #[arg(long, global = true, default_value = ".")]
    pub config: PathBuf,

    /// Database profile to use (id or name), overriding the active one
    #[arg(long, global = true, env = "TABLEFILL_PROFILE")]
    pub profile: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show a table's columns and how each is classified
    Columns(ColumnsArgs),

    /// Print the first INSERT statement of a job without touching the database
    Preview(JobArgs),

    /// Run a job against the database with live progress (Ctrl-C cancels)
    Insert(JobArgs),

    /// Show configured custom value lists
    Lists(ListsArgs),

    /// Test the connection of a database profile
    Ping,
}

#[derive(Parser, Debug)]
pub struct ColumnsArgs {
    /// Table to introspect
    #[arg(long)]
    pub table: String,

    /// Database (schema) to look in instead of the profile's
    #[arg(long)]
    pub database: Option<String>,

    /// Output format
    #[arg(long, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct JobArgs {
    /// Generation request as JSON (tableName, totalRows, batchSize, columns, fieldConfigs)
    #[arg(long, conflicts_with = "table_profile")]
    pub input: Option<PathBuf>,

    /// Saved table profile from tablefill.toml (id or profile name)
    #[arg(long)]
    pub table_profile: Option<String>,

    /// Total rows to insert
    #[arg(long)]
    pub rows: Option<i64>,

    /// Rows per INSERT statement
    #[arg(long)]
    pub batch_size: Option<i64>,

    /// Target database instead of the profile's
    #[arg(long)]
    pub database: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ListsArgs {
    /// Only show lists of this value type
    #[arg(long)]
    pub value_type: Option<ListType>,

    /// Output format
    #[arg(long, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListType {
    String,
    Number,
}

impl From<ListType> for ValueKind {
    fn from(t: ListType) -> Self {
        match t {
            ListType::String => ValueKind::String,
            ListType::Number => ValueKind::Number,
        }
    }
}
