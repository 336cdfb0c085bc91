//! tcforge CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "tcforge",
    version,
    about = "Test case generation and grading for contest problems"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and example problem
    Init,

    /// Check a problem definition
    Validate {
        /// Path to the problem .toml
        #[arg(long)]
        problem: PathBuf,
    },

    /// Write the problem's test files
    Generate {
        /// Path to the problem .toml
        #[arg(long)]
        problem: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Reference solution command (overrides the config)
        #[arg(long)]
        solution: Option<String>,
    },

    /// Grade a solution against the generated test files
    Grade {
        /// Path to the problem .toml
        #[arg(long)]
        problem: PathBuf,

        /// Solution command line
        #[arg(long)]
        solution: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Where to write the JSON report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Exit code 1 unless every test case is accepted
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tcforge=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { problem } => commands::validate::execute(problem),
        Commands::Generate {
            problem,
            config,
            solution,
        } => commands::generate::execute(problem, config, solution).await,
        Commands::Grade {
            problem,
            solution,
            config,
            report,
            strict,
        } => commands::grade::execute(problem, solution, config, report, strict).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
