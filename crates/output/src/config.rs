use std::path::Path;

use reclink_io::csv::CsvDataset;
use reclink_io::fixed::FixedWidthDataset;
use reclink_io::{Column, Dataset, FixedWidthField};
use serde::Deserialize;

use crate::error::OutputError;
use crate::model::LinkMode;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub mode: LinkMode,
    pub weights: WeightsConfig,
    #[serde(default)]
    pub classification: Option<ClassificationConfig>,
    #[serde(default)]
    pub histogram: Option<HistogramConfig>,
    #[serde(default)]
    pub match_status: Option<MatchStatusConfig>,
    #[serde(default)]
    pub datasets: DatasetsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    pub file: String,
}

/// Pair-list files written by the classifier, one `id1,id2` per line.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassificationConfig {
    pub matches: String,
    pub non_matches: String,
    #[serde(default)]
    pub possible_matches: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistogramConfig {
    pub bin_width: f64,
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchStatusConfig {
    pub output: String,
}

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetsConfig {
    #[serde(default)]
    pub first: Option<DatasetConfig>,
    #[serde(default)]
    pub second: Option<DatasetConfig>,
}

impl DatasetsConfig {
    pub fn is_empty(&self) -> bool {
        self.first.is_none() && self.second.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Csv,
    FixedWidth,
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::FixedWidth => write!(f, "fixed_width"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub kind: DatasetKind,
    pub file: String,
    pub rec_ident: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to true for CSV, false for fixed-width.
    #[serde(default)]
    pub header_line: Option<bool>,
    #[serde(default = "default_true")]
    pub strip_fields: bool,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default)]
    pub rec_id_prefix: String,
    pub fields: Vec<FieldConfig>,
    pub output: String,
    #[serde(default = "default_match_id_field")]
    pub match_id_field: String,
}

/// A CSV field names its `column`; a fixed-width field its `width`.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(default)]
    pub column: Option<usize>,
    #[serde(default)]
    pub width: Option<usize>,
}

fn default_true() -> bool {
    true
}

fn default_delimiter() -> String {
    ",".into()
}

fn default_match_id_field() -> String {
    "match_id".into()
}

impl DatasetConfig {
    /// Open the dataset, resolving `file` against `base_dir`.
    pub fn open(&self, base_dir: &Path) -> Result<Box<dyn Dataset>, OutputError> {
        let path = base_dir.join(&self.file);
        let description = if self.description.is_empty() {
            self.file.clone()
        } else {
            self.description.clone()
        };

        match self.kind {
            DatasetKind::Csv => {
                let columns = self
                    .fields
                    .iter()
                    .map(|f| {
                        f.column.map(|c| Column::new(f.name.clone(), c)).ok_or_else(|| {
                            OutputError::ConfigValidation(format!(
                                "csv field '{}' needs a column",
                                f.name
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let ds = CsvDataset::new(description, path, self.rec_ident.clone(), columns)
                    .with_delimiter(self.delimiter_byte()?)
                    .with_header_line(self.header_line.unwrap_or(true))
                    .with_strip_fields(self.strip_fields)
                    .with_rec_id_prefix(self.rec_id_prefix.clone());
                Ok(Box::new(ds))
            }
            DatasetKind::FixedWidth => {
                let fields = self
                    .fields
                    .iter()
                    .map(|f| {
                        f.width
                            .map(|width| FixedWidthField { name: f.name.clone(), width })
                            .ok_or_else(|| {
                                OutputError::ConfigValidation(format!(
                                    "fixed_width field '{}' needs a width",
                                    f.name
                                ))
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let ds = FixedWidthDataset::new(description, path, self.rec_ident.clone(), fields)
                    .with_header_line(self.header_line.unwrap_or(false))
                    .with_strip_fields(self.strip_fields)
                    .with_rec_id_prefix(self.rec_id_prefix.clone());
                Ok(Box::new(ds))
            }
        }
    }

    pub fn delimiter_byte(&self) -> Result<u8, OutputError> {
        match self.delimiter.as_bytes() {
            [b] => Ok(*b),
            _ => Err(OutputError::ConfigValidation(format!(
                "delimiter must be a single byte, got {:?}",
                self.delimiter
            ))),
        }
    }

    fn validate(&self, side: &str) -> Result<(), OutputError> {
        let err = |msg: String| OutputError::ConfigValidation(format!("datasets.{side}: {msg}"));

        if self.fields.is_empty() {
            return Err(err("at least one field is required".into()));
        }
        if self.rec_ident.is_empty() {
            return Err(err("rec_ident must not be empty".into()));
        }
        if self.match_id_field.is_empty() {
            return Err(err("match_id_field must not be empty".into()));
        }
        if self.output.is_empty() {
            return Err(err("output must not be empty".into()));
        }
        self.delimiter_byte().map_err(|e| err(e.to_string()))?;

        for field in &self.fields {
            let ok = match self.kind {
                DatasetKind::Csv => field.column.is_some(),
                DatasetKind::FixedWidth => field.width.is_some(),
            };
            if !ok {
                let attr = match self.kind {
                    DatasetKind::Csv => "column",
                    DatasetKind::FixedWidth => "width",
                };
                return Err(err(format!(
                    "{} field '{}' needs a {attr}",
                    self.kind, field.name
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl JobConfig {
    pub fn from_toml(input: &str) -> Result<Self, OutputError> {
        let config: JobConfig =
            toml::from_str(input).map_err(|e| OutputError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), OutputError> {
        if self.name.trim().is_empty() {
            return Err(OutputError::ConfigValidation("name must not be empty".into()));
        }

        if self.weights.file.is_empty() {
            return Err(OutputError::ConfigValidation("weights.file must not be empty".into()));
        }

        if let Some(ref histogram) = self.histogram {
            if !(histogram.bin_width.is_finite() && histogram.bin_width > 0.0) {
                return Err(OutputError::ConfigValidation(format!(
                    "histogram.bin_width must be positive, got {}",
                    histogram.bin_width
                )));
            }
        }

        // Match identifiers come from the match set
        if self.classification.is_none() {
            if self.match_status.is_some() {
                return Err(OutputError::ConfigValidation(
                    "match_status requires a [classification] section".into(),
                ));
            }
            if !self.datasets.is_empty() {
                return Err(OutputError::ConfigValidation(
                    "datasets require a [classification] section".into(),
                ));
            }
        }

        match (self.mode, &self.datasets.first, &self.datasets.second) {
            (_, None, None) => {}
            (_, None, Some(_)) => {
                return Err(OutputError::ConfigValidation(
                    "datasets.second given without datasets.first".into(),
                ));
            }
            (LinkMode::Deduplication, Some(_), Some(_)) => {
                return Err(OutputError::ConfigValidation(
                    "deduplication uses a single dataset, remove datasets.second".into(),
                ));
            }
            (LinkMode::Linkage, Some(_), None) => {
                return Err(OutputError::ConfigValidation(
                    "linkage requires both datasets.first and datasets.second".into(),
                ));
            }
            (_, Some(_), _) => {}
        }

        if let Some(ref first) = self.datasets.first {
            first.validate("first")?;
        }
        if let Some(ref second) = self.datasets.second {
            second.validate("second")?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_DEDUP: &str = r#"
name = "Census dedup"
mode = "deduplication"

[weights]
file = "weights.csv"

[classification]
matches = "matches.csv"
non_matches = "non_matches.csv"

[histogram]
bin_width = 1.0
output = "histogram.txt"

[match_status]
output = "status.csv"

[datasets.first]
kind = "csv"
file = "census.csv"
rec_ident = "rec_id"
fields = [
  { name = "rec_id", column = 0 },
  { name = "surname", column = 1 },
]
output = "census_mid.csv"
"#;

    const LINKAGE_BASE: &str = r#"
name = "Link"
mode = "linkage"

[weights]
file = "weights.csv"

[classification]
matches = "m.csv"
non_matches = "n.csv"
possible_matches = "p.csv"

[datasets.first]
kind = "csv"
file = "a.csv"
rec_ident = "rec_id"
fields = [{ name = "surname", column = 0 }]
output = "a_mid.csv"
"#;

    #[test]
    fn parse_valid_dedup() {
        let config = JobConfig::from_toml(VALID_DEDUP).unwrap();
        assert_eq!(config.name, "Census dedup");
        assert_eq!(config.mode, LinkMode::Deduplication);
        assert_eq!(config.histogram.as_ref().unwrap().bin_width, 1.0);
        let first = config.datasets.first.as_ref().unwrap();
        assert_eq!(first.kind, DatasetKind::Csv);
        assert_eq!(first.match_id_field, "match_id");
        assert_eq!(first.delimiter, ",");
        assert!(first.strip_fields);
        assert_eq!(first.header_line, None);
        assert!(config.datasets.second.is_none());
    }

    #[test]
    fn parse_linkage_with_fixed_width_second() {
        let input = format!(
            r#"{LINKAGE_BASE}
[datasets.second]
kind = "fixed_width"
file = "b.txt"
rec_ident = "id"
fields = [{{ name = "id", width = 6 }}, {{ name = "surname", width = 12 }}]
output = "b_mid.csv"
match_id_field = "mids"
"#
        );
        let config = JobConfig::from_toml(&input).unwrap();
        let second = config.datasets.second.unwrap();
        assert_eq!(second.kind, DatasetKind::FixedWidth);
        assert_eq!(second.fields[1].width, Some(12));
        assert_eq!(second.match_id_field, "mids");
        assert_eq!(
            config.classification.unwrap().possible_matches.as_deref(),
            Some("p.csv")
        );
    }

    #[test]
    fn reject_linkage_with_one_dataset() {
        let err = JobConfig::from_toml(LINKAGE_BASE).unwrap_err();
        assert!(err.to_string().contains("linkage requires both"), "{err}");
    }

    #[test]
    fn reject_dedup_with_two_datasets() {
        let input = format!(
            r#"{VALID_DEDUP}
[datasets.second]
kind = "csv"
file = "b.csv"
rec_ident = "rec_id"
fields = [{{ name = "rec_id", column = 0 }}]
output = "b_mid.csv"
"#
        );
        let err = JobConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("single dataset"), "{err}");
    }

    #[test]
    fn reject_non_positive_bin_width() {
        let input = VALID_DEDUP.replace("bin_width = 1.0", "bin_width = 0.0");
        let err = JobConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("bin_width must be positive"), "{err}");
    }

    #[test]
    fn reject_match_status_without_classification() {
        let input = r#"
name = "Histogram only"
mode = "deduplication"

[weights]
file = "w.csv"

[match_status]
output = "status.csv"
"#;
        let err = JobConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("requires a [classification]"), "{err}");
    }

    #[test]
    fn reject_csv_field_without_column() {
        let input = VALID_DEDUP.replace("{ name = \"surname\", column = 1 }", "{ name = \"surname\", width = 8 }");
        let err = JobConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("field 'surname' needs a column"), "{err}");
    }

    #[test]
    fn reject_multi_char_delimiter() {
        let input = VALID_DEDUP.replace("rec_ident = \"rec_id\"", "rec_ident = \"rec_id\"\ndelimiter = \"||\"");
        let err = JobConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("single byte"), "{err}");
    }

    #[test]
    fn reject_unknown_mode() {
        let input = VALID_DEDUP.replace("mode = \"deduplication\"", "mode = \"dedupe\"");
        let err = JobConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, OutputError::ConfigParse(_)), "{err}");
    }

    #[test]
    fn histogram_only_job_is_valid() {
        let input = r#"
name = "Histogram only"
mode = "linkage"

[weights]
file = "w.csv"

[histogram]
bin_width = 0.5
"#;
        let config = JobConfig::from_toml(input).unwrap();
        assert!(config.classification.is_none());
        assert!(config.datasets.is_empty());
    }
}
