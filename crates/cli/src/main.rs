// reclink CLI - histogram, match status and annotated dataset output for
// record linkage and deduplication runs

mod exit_codes;
mod job;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use reclink_output::classification::load_pair_set;
use reclink_output::{
    generate_histogram, load_weight_vectors, save_match_status, ClassificationPartition, OutputError,
};
use tracing_subscriber::EnvFilter;

use exit_codes::{output_exit_code, EXIT_SUCCESS, EXIT_USAGE};

/// Environment variable holding the log filter (e.g. `reclink_output=debug`).
const LOG_ENV: &str = "RECLINK_LOG";

#[derive(Parser)]
#[command(name = "reclink")]
#[command(about = "Weight histograms, match status files and match-annotated datasets")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug); RECLINK_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an output job from a TOML file
    #[command(after_help = "\
Examples:
  reclink run census.job.toml
  reclink run census.job.toml --json
  reclink run census.job.toml --output report.json")]
    Run {
        /// Path to the job file; relative paths inside resolve against its directory
        job: PathBuf,

        /// Output the JSON run report to stdout instead of the histogram
        #[arg(long)]
        json: bool,

        /// Write the JSON run report to file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a job file without running it
    #[command(after_help = "\
Examples:
  reclink validate census.job.toml")]
    Validate {
        /// Path to the job file
        job: PathBuf,
    },

    /// Print a histogram of summed weights
    #[command(after_help = "\
Examples:
  reclink histogram weights.csv --bin-width 1
  reclink histogram weights.csv.gz --bin-width 0.5 --output hist.txt
  reclink histogram weights.csv --bin-width 1 --matches m.csv --non-matches n.csv
  reclink histogram weights.csv --bin-width 1 --matches m.csv --non-matches n.csv --possible-matches p.csv")]
    Histogram {
        /// Weight-vector file (a .gz sibling is used when present)
        weights: PathBuf,

        /// Width of each weight bin
        #[arg(long)]
        bin_width: f64,

        /// Also write the histogram to this file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Matched pairs (id1,id2 per line, no header)
        #[arg(long, requires = "non_matches")]
        matches: Option<PathBuf>,

        /// Non-matched pairs
        #[arg(long, requires = "matches")]
        non_matches: Option<PathBuf>,

        /// Possible matches (omit when the classifier produced none)
        #[arg(long, requires = "matches")]
        possible_matches: Option<PathBuf>,
    },

    /// Write the match-status file for a set of matched pairs
    #[command(after_help = "\
Examples:
  reclink status weights.csv --matches m.csv --output status.csv
  reclink status weights.csv --matches m.csv --output status.csv.gz")]
    Status {
        /// Weight-vector file
        weights: PathBuf,

        /// Matched pairs (id1,id2 per line, no header)
        #[arg(long)]
        matches: PathBuf,

        /// Output file (gzip-compressed when it ends in .gz)
        #[arg(long, short = 'o')]
        output: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\noutput:  reclink-output ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    // Also routes `log` records from the library crates
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: reclink <command> [options]");
            eprintln!("       reclink --help for more information");
            Ok(())
        }
        Some(Commands::Run { job, json, output }) => job::cmd_run(job, json, output),
        Some(Commands::Validate { job }) => job::cmd_validate(job),
        Some(Commands::Histogram {
            weights,
            bin_width,
            output,
            matches,
            non_matches,
            possible_matches,
        }) => cmd_histogram(weights, bin_width, output, matches, non_matches, possible_matches),
        Some(Commands::Status { weights, matches, output }) => cmd_status(weights, matches, output),
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
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: exit_codes::EXIT_IO, message: msg.into(), hint: None }
    }

    /// Create error from a library error with the mapped exit code.
    pub fn output(err: OutputError) -> Self {
        let hint = match &err {
            OutputError::Validation(msg) if msg.contains("in both") => {
                Some("a pair may belong to only one of the match classes".to_string())
            }
            OutputError::UnknownPair { .. } => {
                Some("every matched pair needs a row in the weight-vector file".to_string())
            }
            _ => None,
        };
        Self { code: output_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// histogram
// ============================================================================

fn load_partition(
    matches: &Path,
    non_matches: &Path,
    possible_matches: Option<&Path>,
) -> Result<ClassificationPartition, CliError> {
    let possible = match possible_matches {
        Some(path) => load_pair_set(path).map_err(CliError::output)?,
        None => BTreeSet::new(),
    };
    Ok(ClassificationPartition::new(
        load_pair_set(matches).map_err(CliError::output)?,
        load_pair_set(non_matches).map_err(CliError::output)?,
        possible,
    ))
}

fn cmd_histogram(
    weights: PathBuf,
    bin_width: f64,
    output: Option<PathBuf>,
    matches: Option<PathBuf>,
    non_matches: Option<PathBuf>,
    possible_matches: Option<PathBuf>,
) -> Result<(), CliError> {
    if !(bin_width.is_finite() && bin_width > 0.0) {
        return Err(CliError::args(format!("--bin-width must be positive, got {bin_width}")));
    }

    let file = load_weight_vectors(&weights).map_err(CliError::output)?;

    let partition = match (matches, non_matches) {
        (Some(m), Some(n)) => Some(load_partition(&m, &n, possible_matches.as_deref())?),
        _ => None,
    };

    let lines = generate_histogram(&file.vectors, bin_width, output.as_deref(), partition.as_ref())
        .map_err(CliError::output)?;

    if lines.is_empty() {
        eprintln!("no weight vectors in {}", weights.display());
        return Ok(());
    }

    for line in &lines {
        println!("{line}");
    }
    if let Some(ref path) = output {
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

// ============================================================================
// status
// ============================================================================

fn cmd_status(weights: PathBuf, matches: PathBuf, output: PathBuf) -> Result<(), CliError> {
    let file = load_weight_vectors(&weights).map_err(CliError::output)?;
    let match_set = load_pair_set(&matches).map_err(CliError::output)?;

    let rows = save_match_status(&file.vectors, &match_set, &output).map_err(CliError::output)?;
    eprintln!("wrote {} match status row(s) to {}", rows, output.display());
    Ok(())
}
