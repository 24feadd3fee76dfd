use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Record pairs + weights
// ---------------------------------------------------------------------------

/// The two record identifiers of a compared pair.
///
/// Ordering is lexicographic on `id1`, then `id2`; match identifiers are
/// assigned in this order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordIdPair {
    pub id1: String,
    pub id2: String,
}

impl RecordIdPair {
    pub fn new(id1: impl Into<String>, id2: impl Into<String>) -> Self {
        Self { id1: id1.into(), id2: id2.into() }
    }
}

impl fmt::Display for RecordIdPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.id1, self.id2)
    }
}

/// Per-field comparison weights for one pair.
pub type WeightVector = Vec<f64>;

/// All weight vectors of a run. Vectors share one dimensionality.
pub type WeightVectorMap = BTreeMap<RecordIdPair, WeightVector>;

/// Matching weight of a pair: the plain sum of its field weights.
pub fn weight_sum(vector: &[f64]) -> f64 {
    vector.iter().sum()
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Deduplication compares records of one dataset; linkage compares records
/// of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMode {
    Deduplication,
    Linkage,
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deduplication => write!(f, "deduplication"),
            Self::Linkage => write!(f, "linkage"),
        }
    }
}
