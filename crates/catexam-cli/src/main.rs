//! catexam CLI — simulate, validate, and inspect adaptive exams.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "catexam", version, about = "Computerized adaptive testing engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated examinee through an adaptive exam
    Simulate {
        /// Path to the .toml item bank
        #[arg(long)]
        bank: PathBuf,

        /// True ability of the simulated examinee
        #[arg(long, allow_hyphen_values = true)]
        ability: f64,

        /// Seed for item selection and simulated answers
        #[arg(long)]
        seed: Option<u64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for the JSON report
        #[arg(long, default_value = "./catexam-results")]
        output: PathBuf,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate item bank TOML files
    Validate {
        /// Path to item bank file or directory
        #[arg(long)]
        bank: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print a saved exam report
    Inspect {
        /// Report JSON
        #[arg(long)]
        report: PathBuf,

        /// Output format: text, markdown, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create starter config and example item bank
    Init,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("catexam=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            bank,
            ability,
            seed,
            config,
            output,
            format,
        } => commands::simulate::execute(bank, ability, seed, config, output, format),
        Commands::Validate { bank, config } => commands::validate::execute(bank, config),
        Commands::Inspect { report, format } => commands::inspect::execute(report, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
