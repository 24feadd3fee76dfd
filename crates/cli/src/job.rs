//! `reclink run` / `reclink validate`: TOML-driven output jobs.

use std::path::{Path, PathBuf};

use reclink_output::engine::RunReport;
use reclink_output::JobConfig;

use crate::exit_codes::{EXIT_ERROR, EXIT_IO};
use crate::CliError;

fn read_job(job_path: &Path) -> Result<JobConfig, CliError> {
    let text = std::fs::read_to_string(job_path).map_err(|e| {
        CliError::io(format!("cannot read job file {}: {e}", job_path.display()))
    })?;
    JobConfig::from_toml(&text).map_err(|e| {
        CliError::output(e).with_hint(format!("check {}", job_path.display()))
    })
}

pub fn cmd_run(job_path: PathBuf, json_output: bool, output_file: Option<PathBuf>) -> Result<(), CliError> {
    let config = read_job(&job_path)?;

    // Resolve file paths relative to the job file's directory
    let base_dir = job_path.parent().unwrap_or_else(|| Path::new("."));
    log::info!("running job '{}' ({}) from {}", config.name, config.mode, base_dir.display());

    let report = reclink_output::run(&config, base_dir).map_err(CliError::output)?;

    let json_str = serde_json::to_string_pretty(&report)
        .map_err(|e| CliError { code: EXIT_ERROR, message: format!("JSON serialization error: {e}"), hint: None })?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError { code: EXIT_IO, message: format!("cannot write output: {e}"), hint: None })?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    } else {
        for line in &report.histogram {
            println!("{line}");
        }
    }

    print_summary(&report);
    Ok(())
}

/// Human summary to stderr.
fn print_summary(report: &RunReport) {
    let s = &report.summary;
    eprintln!(
        "{} job '{}': {} weight vector(s) over {} field(s)",
        report.meta.mode,
        report.meta.job_name,
        s.weight_vectors,
        s.comparison_fields.len(),
    );

    if let (Some(m), Some(n), Some(p)) = (s.matches, s.non_matches, s.possible_matches) {
        eprintln!("classification: {m} match(es), {n} non-match(es), {p} possible match(es)");
    }

    if let Some(ref status) = report.match_status {
        eprintln!("match status: {} row(s) -> {}", status.rows, status.path.display());
    }

    for ds in &report.datasets {
        eprintln!(
            "dataset: {} record(s), {} with match identifiers -> {}",
            ds.records,
            ds.matched_records,
            ds.path.display(),
        );
    }
}

pub fn cmd_validate(job_path: PathBuf) -> Result<(), CliError> {
    let config = read_job(&job_path)?;

    let datasets = usize::from(config.datasets.first.is_some())
        + usize::from(config.datasets.second.is_some());
    eprintln!(
        "valid: {} job '{}' with {} dataset(s){}",
        config.mode,
        config.name,
        datasets,
        if config.classification.is_some() { ", classification" } else { "" },
    );
    Ok(())
}
