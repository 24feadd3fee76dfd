// ASCII weight histogram, rotated 90° (bins run top to bottom)

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ordered_float::OrderedFloat;
use reclink_io::LINE_ENDING;

use crate::classification::{ClassificationPartition, MatchClass};
use crate::error::OutputError;
use crate::model::{weight_sum, WeightVectorMap};

/// Maximum width of a histogram line, in characters.
pub const MAX_HISTOGRAM_WIDTH: usize = 80;

/// Bin key of a summed weight: `sum - (sum mod bin_width)` with a floored
/// modulo, so negative sums fall into the bin below them.
pub fn bin_key(sum: f64, bin_width: f64) -> f64 {
    sum - sum.rem_euclid(bin_width)
}

// ---------------------------------------------------------------------------
// Bin table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinCounts {
    pub total: usize,
    pub matches: usize,
    pub non_matches: usize,
    pub possible_matches: usize,
}

/// Counts per bin, built in a single scan over the weight vectors.
#[derive(Debug, Clone, Default)]
pub struct BinTable {
    bins: BTreeMap<OrderedFloat<f64>, BinCounts>,
    max_count: usize,
}

impl BinTable {
    pub fn build(
        mapping: &WeightVectorMap,
        bin_width: f64,
        partition: Option<&ClassificationPartition>,
    ) -> Self {
        let mut table = Self::default();

        for (pair, vector) in mapping {
            let key = OrderedFloat(bin_key(weight_sum(vector), bin_width));
            let counts = table.bins.entry(key).or_default();

            counts.total += 1;
            table.max_count = table.max_count.max(counts.total);

            if let Some(partition) = partition {
                match partition.class_of(pair) {
                    MatchClass::Match => counts.matches += 1,
                    MatchClass::NonMatch => counts.non_matches += 1,
                    MatchClass::PossibleMatch => counts.possible_matches += 1,
                }
            }
        }

        table
    }

    /// Bins in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &BinCounts)> {
        self.bins.iter().map(|(k, c)| (k.0, c))
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    pub fn total(&self) -> usize {
        self.bins.values().map(|c| c.total).sum()
    }

    fn has_possible_matches(&self) -> bool {
        self.bins.values().any(|c| c.possible_matches > 0)
    }
}

// ---------------------------------------------------------------------------
// Report shape
// ---------------------------------------------------------------------------

/// Table layout of the report, fixed once before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportShape {
    /// Combined counts only.
    Plain,
    /// Match and non-match columns.
    MatchNonMatch,
    /// Match, non-match and possible-match columns.
    Full,
}

impl ReportShape {
    fn select(table: &BinTable, partition: Option<&ClassificationPartition>) -> Self {
        match partition {
            None => Self::Plain,
            Some(_) if !table.has_possible_matches() => Self::MatchNonMatch,
            Some(_) => Self::Full,
        }
    }

    /// Characters taken by the count and weight columns before the bar.
    pub fn reserved_width(self) -> usize {
        match self {
            Self::Plain => 19,
            Self::MatchNonMatch => 30,
            Self::Full => 41,
        }
    }

    fn header(self) -> &'static [&'static str] {
        match self {
            Self::Plain => &["  Counts  | w_sum |", "-------------------"],
            Self::MatchNonMatch => &[
                "       Counts        |",
                "  Match   | Non-Match| w_sum |",
                "------------------------------",
            ],
            Self::Full => &[
                "              Counts            |",
                "  Match   | Non-Match|Poss-Match| w_sum |",
                "-----------------------------------------",
            ],
        }
    }

    fn row(self, key: f64, counts: &BinCounts) -> String {
        match self {
            Self::Plain => format!("{:9} | {:5.2} |", counts.total, key),
            Self::MatchNonMatch => {
                format!("{:9} |{:9} | {:5.2} |", counts.matches, counts.non_matches, key)
            }
            Self::Full => format!(
                "{:9} |{:9} |{:9} | {:5.2} |",
                counts.matches, counts.non_matches, counts.possible_matches, key
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Build the histogram of summed weights and return it as text lines.
///
/// With a partition, per-class counts are shown next to each bin. The bar
/// always reflects the combined count. With a destination, the same lines
/// are also written to that file.
///
/// An empty mapping yields no lines and no file.
pub fn generate_histogram(
    mapping: &WeightVectorMap,
    bin_width: f64,
    destination: Option<&Path>,
    partition: Option<&ClassificationPartition>,
) -> Result<Vec<String>, OutputError> {
    if !(bin_width.is_finite() && bin_width > 0.0) {
        return Err(OutputError::Validation(format!(
            "bin width must be a positive number, got {bin_width}"
        )));
    }
    if let Some(partition) = partition {
        partition.validate(mapping)?;
    }

    if mapping.is_empty() {
        log::warn!("empty weight vector mapping given for histogram generation");
        return Ok(Vec::new());
    }

    let table = BinTable::build(mapping, bin_width, partition);
    debug_assert_eq!(table.total(), mapping.len());

    let shape = ReportShape::select(&table, partition);
    let lines = render(&table, shape);

    if let Some(path) = destination {
        write_lines(path, &lines)?;
        log::info!("histogram written to {}", path.display());
    }

    if partition.is_some() {
        for (key, counts) in table.iter() {
            log::debug!(
                "bin {key:.2}: {} match, {} non-match, {} possible",
                counts.matches,
                counts.non_matches,
                counts.possible_matches
            );
        }
    }

    Ok(lines)
}

fn render(table: &BinTable, shape: ReportShape) -> Vec<String> {
    // max_count >= 1 for a non-empty table
    let scale = (MAX_HISTOGRAM_WIDTH - shape.reserved_width()) as f64 / table.max_count() as f64;

    let mut lines = Vec::with_capacity(table.len() + 6);
    lines.push("Weight histogram:".to_string());
    lines.push("-----------------".to_string());
    lines.extend(shape.header().iter().map(|s| s.to_string()));

    for (key, counts) in table.iter() {
        let mut line = shape.row(key, counts);
        let bar = (counts.total as f64 * scale) as usize;
        line.push_str(&"*".repeat(bar));
        lines.push(line);
    }

    lines.push(String::new());
    lines
}

fn write_lines(path: &Path, lines: &[String]) -> Result<(), OutputError> {
    let file = File::create(path).map_err(|e| OutputError::io(path, e))?;
    let mut out = BufWriter::new(file);
    for line in lines {
        out.write_all(line.as_bytes())
            .and_then(|_| out.write_all(LINE_ENDING.as_bytes()))
            .map_err(|e| OutputError::io(path, e))?;
    }
    out.flush().map_err(|e| OutputError::io(path, e))
}
