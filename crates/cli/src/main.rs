// Crosswalk CLI - headless match & migration runs

mod exit_codes;
mod review;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_INVALID_CONFIG, EXIT_RUNTIME, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "xwalk")]
#[command(about = "Match and deduplicate records across inventory systems")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a match & deduplication pass from a TOML config file
    #[command(after_help = "\
Examples:
  xwalk run crosswalk.toml
  xwalk run crosswalk.toml --dry-run
  xwalk run crosswalk.toml --apply
  xwalk run crosswalk.toml --json --output-dir out/")]
    Run {
        /// Path to the crosswalk TOML config file
        config: PathBuf,

        /// Decide everything, write nothing
        #[arg(long)]
        dry_run: bool,

        /// Push auto_update and create_new decisions to the target system
        #[arg(long, conflicts_with = "dry_run")]
        apply: bool,

        /// Output report JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Directory for the report and review-queue files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Validate a config without running
    #[command(after_help = "\
Examples:
  xwalk validate crosswalk.toml")]
    Validate {
        /// Path to the crosswalk TOML config file
        config: PathBuf,
    },

    /// Review queue operations
    Review {
        #[command(subcommand)]
        command: ReviewCommands,
    },
}

#[derive(Subcommand)]
enum ReviewCommands {
    /// Apply reviewer verdicts from an edited review-queue CSV
    #[command(after_help = "\
Examples:
  xwalk review apply crosswalk.toml manual_review_20260826T120000Z.csv
  xwalk review apply crosswalk.toml reviewed.csv --dry-run")]
    Apply {
        /// Path to the crosswalk TOML config file
        config: PathBuf,

        /// Review CSV with the resolution column filled in
        csv: PathBuf,

        /// Count verdicts without writing to the target system
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, dry_run, apply, json, output_dir } => {
            run::cmd_run(config, dry_run, apply, json, output_dir)
        }
        Commands::Validate { config } => run::cmd_validate(config),
        Commands::Review { command } => match command {
            ReviewCommands::Apply { config, csv, dry_run } => {
                review::cmd_review_apply(config, csv, dry_run)
            }
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INVALID_CONFIG, message: msg.into(), hint: None }
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Self { code: EXIT_RUNTIME, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
