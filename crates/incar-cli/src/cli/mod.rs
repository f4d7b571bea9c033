mod commands;
mod helpers;

use clap::Parser;
use incar_core::domain::IncarError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const PROGRAM_NAME: &str = "incar-gen";
const LOG_ENV: &str = "INCAR_LOG";

pub fn run_from_env() -> i32 {
    let args = std::env::args().skip(1).collect::<Vec<_>>();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let incar_error = error.as_incar_error();
            eprintln!("{}", incar_error.diagnostic_line());
            eprintln!("{}", incar_error.fatal_exit_line());
            incar_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once(PROGRAM_NAME.to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            if let Err(error) = init_logging(cli.global.verbose) {
                eprintln!("warning: logging disabled: {}", error);
            }
            dispatch_parsed(cli.global, cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

/// Logs go to stderr so stdout carries only the document or JSON.
fn init_logging(verbose: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
}

#[derive(Parser)]
#[command(name = "incar-gen", version, about = "VASP INCAR generator")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Args)]
pub(crate) struct GlobalArgs {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Standard parameter table (JSON)
    #[arg(long, global = true)]
    standard_table: Option<PathBuf>,

    /// Built-in task preset table (JSON)
    #[arg(long, global = true)]
    task_table: Option<PathBuf>,

    /// Task category configuration (JSON); falls back to $INCAR_TASK_CONFIG
    #[arg(long, global = true)]
    task_config: Option<PathBuf>,

    /// Element property table for DFT+U and MAGMOM (JSON)
    #[arg(long, global = true)]
    element_table: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Generate an INCAR document from task selections and overrides
    Generate(commands::GenerateArgs),
    /// List selectable tasks grouped by category
    Categories(commands::ListingArgs),
    /// Print the parameters of one task
    TaskParams(commands::TaskParamsArgs),
    /// List standard sections and their parameters
    Standard(commands::ListingArgs),
    /// Print LDAUL/LDAUU/LDAUJ for the species of a POSCAR
    Dftu(commands::PoscarArgs),
    /// Print MAGMOM for the species of a POSCAR
    Magmom(commands::PoscarArgs),
    /// Print IMAGES for a NEB directory layout
    NebImages(commands::NebImagesArgs),
}

fn dispatch_parsed(global: GlobalArgs, command: CliCommand) -> Result<i32, CliError> {
    let tables = helpers::load_tables(&global)?;
    match command {
        CliCommand::Generate(args) => commands::run_generate_command(&tables, args),
        CliCommand::Categories(args) => commands::run_categories_command(&tables, args),
        CliCommand::TaskParams(args) => commands::run_task_params_command(&tables, args),
        CliCommand::Standard(args) => commands::run_standard_command(&tables, args),
        CliCommand::Dftu(args) => commands::run_dftu_command(&tables, args),
        CliCommand::Magmom(args) => commands::run_magmom_command(&tables, args),
        CliCommand::NebImages(args) => commands::run_neb_images_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(IncarError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_incar_error(&self) -> IncarError {
        match self {
            Self::Usage(message) => {
                IncarError::input_validation("INPUT.CLI_USAGE", message.trim_end().to_string())
            }
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => IncarError::internal("SYS.CLI", format!("{error:#}")),
        }
    }
}

impl From<IncarError> for CliError {
    fn from(error: IncarError) -> Self {
        Self::Compute(error)
    }
}
