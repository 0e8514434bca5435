//! dataimport command-line interface

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dataimport::cli::commands::run::{Mode, RunArgs, handle_run};

#[derive(Parser)]
#[command(
    name = "dataimport",
    version,
    about = "Batch import pipeline for COVID-19-era open datasets"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a pipeline over the named entities
    Run {
        /// Pipeline to run
        #[arg(value_enum)]
        mode: Mode,

        /// Entity names; `_all` expands to every configured entity
        #[arg(required = true)]
        entities: Vec<String>,

        /// Stage to run up to (or exactly, with --only)
        #[arg(short, long)]
        stage: Option<String>,

        /// Run only the named stage instead of the pipeline prefix
        #[arg(short, long)]
        only: bool,

        /// Force datasource updates regardless of max-age freshness
        #[arg(short, long)]
        force_update: bool,

        /// Settings file
        #[arg(short, long, default_value = "dataimport.toml")]
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run {
            mode,
            entities,
            stage,
            only,
            force_update,
            config,
        } => handle_run(&RunArgs {
            mode,
            entities,
            stage,
            only,
            force_update,
            config,
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", anyhow::Error::new(e));
            ExitCode::FAILURE
        }
    }
}
