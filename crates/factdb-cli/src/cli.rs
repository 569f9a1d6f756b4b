//! Command-line tree and dispatch for the `factdb` binary.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::commands::{self, db::AnonymizationProfile};
use crate::config;
use crate::gateway::{CliError, CliResult};

const ROOT_HELP_TEMPLATE: &str = "\
NAME
    {name} - {about}

DESCRIPTION
    A command line tool for interacting with a FactDB service: ad-hoc
    queries plus archive export, import, and status inspection against
    the configured endpoints.

USAGE
    {usage}

COMMANDS
{subcommands}

OPTIONS
{options}
";

const DB_HELP_TEMPLATE: &str = "\
NAME
    {name} - {about}

USAGE
    {usage}

COMMANDS
{subcommands}

OPTIONS
{options}
";

const LEAF_HELP_TEMPLATE: &str = "\
NAME
    {name} - {about}

USAGE
    {usage}

OPTIONS
{all-args}
";

#[derive(Debug, Parser)]
#[command(
    name = "factdb",
    version,
    about = "Query and administer a FactDB service",
    disable_version_flag = true,
    help_template = ROOT_HELP_TEMPLATE
)]
pub(crate) struct Cli {
    /// Show the version of the factdb CLI tool
    #[arg(short = 'v', long = "version", global = true)]
    pub(crate) version: bool,
    /// Enable debug output
    #[arg(short = 'd', long = "debug", global = true)]
    pub(crate) debug: bool,
    /// The path to the factdb CLI config
    #[arg(short = 'c', long = "config", global = true, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,
    /// The urls of your FactDB instances (overrides FACTDB_SERVER_URLS)
    #[arg(long, global = true, value_name = "CSV")]
    pub(crate) urls: Option<String>,
    /// Overrides the path for the CA certificate
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) cacert: Option<PathBuf>,
    /// Overrides the path for the client certificate
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) cert: Option<PathBuf>,
    /// Overrides the path for the client private key
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) key: Option<PathBuf>,
    /// Overrides the path for the auth token file
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) token: Option<PathBuf>,
    #[command(subcommand)]
    pub(crate) command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Query FactDB with an AST or text query
    #[command(help_template = LEAF_HELP_TEMPLATE)]
    Query(QueryArgs),
    /// Manage FactDB administrative tasks
    #[command(help_template = DB_HELP_TEMPLATE)]
    Db {
        #[command(subcommand)]
        command: Option<DbCommand>,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum DbCommand {
    /// Query the status endpoint for each configured FactDB instance
    #[command(help_template = LEAF_HELP_TEMPLATE)]
    Status,
    /// Export an archive from FactDB
    #[command(help_template = LEAF_HELP_TEMPLATE)]
    Export(ExportArgs),
    /// Import a FactDB archive to FactDB
    #[command(help_template = LEAF_HELP_TEMPLATE)]
    Import(ImportArgs),
}

#[derive(Debug, Args)]
pub(crate) struct QueryArgs {
    /// The query to run; text starting with '[' is treated as an AST
    pub(crate) query: String,
}

#[derive(Debug, Args)]
pub(crate) struct ExportArgs {
    /// Archive anonymization profile
    #[arg(
        short = 'a',
        long,
        value_enum,
        default_value_t = AnonymizationProfile::None,
        value_name = "PROFILE"
    )]
    pub(crate) anonymization: AnonymizationProfile,
    /// Path where the export archive will be written
    pub(crate) path: PathBuf,
}

#[derive(Debug, Args)]
pub(crate) struct ImportArgs {
    /// Path of the archive to import
    pub(crate) path: PathBuf,
}

/// Parse the process arguments, execute the requested command, and
/// return the process exit code.
pub async fn run() -> i32 {
    run_from(std::env::args_os()).await
}

pub(crate) async fn run_from<I, T>(argv: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();

    // The version flag short-circuits all further parsing, wherever it
    // appears on the command line.
    if version_requested(&argv) {
        print_version();
        return 0;
    }

    let cli = match Cli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(err) => return handle_parse_error(&err),
    };

    init_logging(cli.debug);

    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => report_failure(&err),
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    // Reachable despite the argv prescan: combined short flags such as
    // `-dv` only surface the version request after parsing.
    if cli.version {
        print_version();
        return Ok(());
    }

    let overrides = config::resolve_overrides(&cli);

    match cli.command {
        None => print_root_help(),
        Some(Command::Query(args)) => commands::query::handle_query(overrides, &args).await,
        Some(Command::Db { command }) => match command {
            None => print_db_help(),
            Some(DbCommand::Status) => commands::db::handle_status(overrides).await,
            Some(DbCommand::Export(args)) => commands::db::handle_export(overrides, &args).await,
            Some(DbCommand::Import(args)) => commands::db::handle_import(overrides, &args).await,
        },
    }
}

fn version_requested(argv: &[OsString]) -> bool {
    argv.iter()
        .skip(1)
        .any(|token| matches!(token.to_str(), Some("--version" | "-v")))
}

fn print_version() {
    println!("factdb {}", env!("CARGO_PKG_VERSION"));
}

/// Help and version requests exit 0; everything else is invalid usage.
fn handle_parse_error(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            let _ = err.print();
            0
        }
        _ => report_failure(&usage_failure(err)),
    }
}

/// Clap's rendered message carries its own trailing newline; trim it so
/// the printed diagnostic stays a single block with no blank tail.
fn usage_failure(err: &clap::Error) -> CliError {
    CliError::usage(err.render().to_string().trim_end())
}

/// The terminal translation from failure to process exit status: one
/// diagnostic line on stderr, then status 1.
fn report_failure(failure: &CliError) -> i32 {
    match failure {
        CliError::InvalidUsage(message) => eprintln!("{message}"),
        other => eprintln!("FATAL: {}", other.display_message()),
    }
    failure.exit_code()
}

/// Install the process-wide logger. The verbosity is decided once per
/// invocation, before any command runs.
fn init_logging(debug: bool) {
    let filter = EnvFilter::new(log_filter(debug));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
    if debug {
        debug!("debug output enabled");
    }
}

const fn log_filter(debug: bool) -> &'static str {
    if debug { "debug" } else { "info" }
}

/// Invoking the root with no subcommand shows help instead of erroring.
fn print_root_help() -> CliResult<()> {
    let mut root = Cli::command();
    println!("{}", root.render_help());
    Ok(())
}

fn print_db_help() -> CliResult<()> {
    let mut root = Cli::command();
    let db = root
        .find_subcommand_mut("db")
        .ok_or_else(|| CliError::unspecified(anyhow!("db command missing from tree")))?;
    println!("{}", db.render_help());
    Ok(())
}
