//! Argument parsing and command dispatch for the Quarry CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use quarry_api_models::{ColumnSpec, ColumnType, IndexKind};
use url::Url;
use uuid::Uuid;

use crate::client::{AppContext, CliResult, parse_url};
use crate::commands::{auth, files, metrics, query, tables};

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Parses CLI arguments, executes the requested command, and returns
/// the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let trace_id = Uuid::new_v4().to_string();
    tracing::debug!(%trace_id, "dispatching command");

    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let ctx = AppContext::build(cli.api_url, cli.timeout, cli.token_file)?;
    let output = cli.output;

    match cli.command {
        Command::Login(args) => auth::handle_login(&ctx, args).await,
        Command::Register(args) => auth::handle_register(&ctx, args).await,
        Command::Logout => auth::handle_logout(&ctx),
        Command::Files(command) => match command {
            FilesCommand::Ls => files::handle_list(&ctx, output).await,
            FilesCommand::Upload(args) => files::handle_upload(&ctx, args).await,
            FilesCommand::Rm(args) => files::handle_remove(&ctx, args).await,
        },
        Command::Tables(command) => match command {
            TablesCommand::Ls => tables::handle_list(&ctx, output).await,
            TablesCommand::Create(args) => tables::handle_create(&ctx, args).await,
            TablesCommand::Rm(args) => tables::handle_remove(&ctx, args).await,
            TablesCommand::Data(args) => tables::handle_data(&ctx, args, output).await,
        },
        Command::Query(args) => query::handle_query(&ctx, args, output).await,
        Command::Metrics => metrics::handle_metrics(&ctx, output).await,
    }
}

#[derive(Parser)]
#[command(name = "quarry", about = "Command-line client for the Quarry database service")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "QUARRY_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    api_url: Url,
    #[arg(
        long,
        global = true,
        env = "QUARRY_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    timeout: u64,
    #[arg(
        long,
        global = true,
        env = "QUARRY_TOKEN_FILE",
        help = "Where the session token is stored between invocations"
    )]
    token_file: Option<PathBuf>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    output: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Login(LoginArgs),
    Register(RegisterArgs),
    Logout,
    #[command(subcommand)]
    Files(FilesCommand),
    #[command(subcommand)]
    Tables(TablesCommand),
    Query(QueryArgs),
    Metrics,
}

#[derive(Args)]
pub(crate) struct LoginArgs {
    #[arg(help = "Account user name")]
    pub(crate) username: String,
    #[arg(long, env = "QUARRY_PASSWORD", help = "Password (prompted when omitted)")]
    pub(crate) password: Option<String>,
}

#[derive(Args)]
pub(crate) struct RegisterArgs {
    #[arg(help = "Account user name")]
    pub(crate) username: String,
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long, env = "QUARRY_PASSWORD", help = "Password (prompted when omitted)")]
    pub(crate) password: Option<String>,
}

#[derive(Subcommand)]
enum FilesCommand {
    Ls,
    Upload(FileUploadArgs),
    Rm(FileRemoveArgs),
}

#[derive(Args)]
pub(crate) struct FileUploadArgs {
    #[arg(help = "Path to the file to upload")]
    pub(crate) path: PathBuf,
}

#[derive(Args)]
pub(crate) struct FileRemoveArgs {
    #[arg(help = "Stored file name")]
    pub(crate) name: String,
}

#[derive(Subcommand)]
enum TablesCommand {
    Ls,
    Create(TableCreateArgs),
    Rm(TableRemoveArgs),
    Data(TableDataArgs),
}

#[derive(Args)]
pub(crate) struct TableCreateArgs {
    #[arg(help = "Name of the table to create")]
    pub(crate) name: String,
    #[arg(short = 'f', long = "file", help = "Source data file to ingest")]
    pub(crate) file: PathBuf,
    #[arg(
        long = "column",
        value_parser = parse_column,
        required = true,
        help = "Column definition as name:TYPE[(size)][:INDEX], e.g. city:VARCHAR(64):BTREE"
    )]
    pub(crate) columns: Vec<ColumnSpec>,
    #[arg(long, help = "Treat the first row of the file as data, not a header")]
    pub(crate) no_header: bool,
}

#[derive(Args)]
pub(crate) struct TableRemoveArgs {
    #[arg(help = "Table name")]
    pub(crate) name: String,
}

#[derive(Args)]
pub(crate) struct TableDataArgs {
    #[arg(help = "Table name")]
    pub(crate) name: String,
    #[arg(long, default_value_t = 1, help = "1-based page number")]
    pub(crate) page: u64,
}

#[derive(Args)]
pub(crate) struct QueryArgs {
    #[arg(help = "SQL statement to execute")]
    pub(crate) sql: String,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn parse_column(value: &str) -> Result<ColumnSpec, String> {
    let (name, rest) = value
        .split_once(':')
        .ok_or_else(|| "expected format name:TYPE[(size)][:INDEX]".to_string())?;
    let name = name.trim();
    if name.is_empty() {
        return Err("column name must not be empty".to_string());
    }

    let (type_str, index_str) = match rest.split_once(':') {
        Some((type_part, index_part)) => (type_part, Some(index_part)),
        None => (rest, None),
    };

    let (data_type, size) = parse_column_type(type_str.trim())?;
    let index_type = index_str.map(parse_index_kind).transpose()?;

    Ok(ColumnSpec {
        name: name.to_string(),
        data_type,
        size,
        index_type,
    })
}

fn parse_column_type(value: &str) -> Result<(ColumnType, Option<u32>), String> {
    let upper = value.to_ascii_uppercase();
    if let Some(inner) = upper.strip_prefix("VARCHAR(") {
        let digits = inner
            .strip_suffix(')')
            .ok_or_else(|| "unclosed size in VARCHAR(n)".to_string())?;
        let size = digits
            .trim()
            .parse::<u32>()
            .map_err(|_| "VARCHAR size must be an integer".to_string())?;
        return Ok((ColumnType::Varchar, Some(size)));
    }

    let data_type = match upper.as_str() {
        "INT" => ColumnType::Int,
        "FLOAT" => ColumnType::Float,
        "DATE" => ColumnType::Date,
        "VARCHAR" => ColumnType::Varchar,
        "BOOLEAN" => ColumnType::Boolean,
        "ARRAY[FLOAT]" => ColumnType::ArrayFloat,
        other => return Err(format!("unknown column type '{other}'")),
    };
    Ok((data_type, None))
}

fn parse_index_kind(value: &str) -> Result<IndexKind, String> {
    match value.trim().to_ascii_uppercase().as_str() {
        "AVL" => Ok(IndexKind::Avl),
        "HASH" => Ok(IndexKind::Hash),
        "BTREE" => Ok(IndexKind::Btree),
        "GIN" => Ok(IndexKind::Gin),
        "ISAM" => Ok(IndexKind::Isam),
        "RTREE" => Ok(IndexKind::Rtree),
        "IVF" => Ok(IndexKind::Ivf),
        "ISH" => Ok(IndexKind::Ish),
        other => Err(format!("unknown index type '{other}'")),
    }
}
