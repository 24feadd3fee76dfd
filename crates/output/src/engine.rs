use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::annotate::{save_match_datasets, AnnotateSummary, DatasetTarget};
use crate::classification::{load_pair_set, ClassificationPartition};
use crate::config::{ClassificationConfig, JobConfig};
use crate::error::OutputError;
use crate::histogram::generate_histogram;
use crate::model::LinkMode;
use crate::status::save_match_status;
use crate::weights::load_weight_vectors;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub job_name: String,
    pub mode: LinkMode,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub weight_vectors: usize,
    pub comparison_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_matches: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub possible_matches: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchStatusSummary {
    pub path: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub meta: RunMeta,
    pub summary: RunSummary,
    pub histogram: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_status: Option<MatchStatusSummary>,
    pub datasets: Vec<AnnotateSummary>,
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Run a job. Relative paths in `config` resolve against `base_dir`.
///
/// Steps run in order: load weights and classification, histogram, match
/// status, annotated datasets. The first failure aborts the run.
pub fn run(config: &JobConfig, base_dir: &Path) -> Result<RunReport, OutputError> {
    let weights = load_weight_vectors(&base_dir.join(&config.weights.file))?;

    let partition = match config.classification {
        Some(ref classification) => {
            let partition = load_partition(classification, base_dir)?;
            partition.validate(&weights.vectors)?;
            Some(partition)
        }
        None => None,
    };

    let histogram = match config.histogram {
        Some(ref histogram) => {
            let destination = histogram.output.as_ref().map(|o| base_dir.join(o));
            generate_histogram(
                &weights.vectors,
                histogram.bin_width,
                destination.as_deref(),
                partition.as_ref(),
            )?
        }
        None => Vec::new(),
    };

    let match_status = match (&config.match_status, &partition) {
        (Some(status), Some(partition)) => {
            let path = base_dir.join(&status.output);
            let rows = save_match_status(&weights.vectors, &partition.matches, &path)?;
            Some(MatchStatusSummary { path, rows })
        }
        _ => None,
    };

    let datasets = match (&config.datasets.first, &partition) {
        (Some(first_cfg), Some(partition)) => {
            let first_ds = first_cfg.open(base_dir)?;
            let first_out = base_dir.join(&first_cfg.output);
            let first = DatasetTarget {
                dataset: first_ds.as_ref(),
                match_id_field: &first_cfg.match_id_field,
                output: &first_out,
            };

            match (config.mode, &config.datasets.second) {
                (LinkMode::Linkage, Some(second_cfg)) => {
                    let second_ds = second_cfg.open(base_dir)?;
                    let second_out = base_dir.join(&second_cfg.output);
                    let second = DatasetTarget {
                        dataset: second_ds.as_ref(),
                        match_id_field: &second_cfg.match_id_field,
                        output: &second_out,
                    };
                    save_match_datasets(&partition.matches, first, Some(second))?
                }
                _ => save_match_datasets(&partition.matches, first, None)?,
            }
        }
        _ => Vec::new(),
    };

    let summary = RunSummary {
        weight_vectors: weights.vectors.len(),
        comparison_fields: weights.field_names.clone(),
        matches: partition.as_ref().map(|p| p.matches.len()),
        non_matches: partition.as_ref().map(|p| p.non_matches.len()),
        possible_matches: partition.as_ref().map(|p| p.possible_matches.len()),
    };

    Ok(RunReport {
        meta: RunMeta {
            job_name: config.name.clone(),
            mode: config.mode,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        histogram,
        match_status,
        datasets,
    })
}

/// Load the classifier's pair lists. A missing possible-match list means
/// the classifier produced none.
pub fn load_partition(
    config: &ClassificationConfig,
    base_dir: &Path,
) -> Result<ClassificationPartition, OutputError> {
    let matches = load_pair_set(&base_dir.join(&config.matches))?;
    let non_matches = load_pair_set(&base_dir.join(&config.non_matches))?;
    let possible_matches = match config.possible_matches {
        Some(ref file) => load_pair_set(&base_dir.join(file))?,
        None => BTreeSet::new(),
    };
    Ok(ClassificationPartition::new(matches, non_matches, possible_matches))
}
