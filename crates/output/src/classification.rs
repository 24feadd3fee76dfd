use std::collections::BTreeSet;
use std::path::Path;

use reclink_io::compress;

use crate::error::OutputError;
use crate::model::{RecordIdPair, WeightVectorMap};

/// Outcome of an upstream classifier for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchClass {
    Match,
    NonMatch,
    PossibleMatch,
}

/// Match / non-match / possible-match split of the compared pairs.
#[derive(Debug, Clone, Default)]
pub struct ClassificationPartition {
    pub matches: BTreeSet<RecordIdPair>,
    pub non_matches: BTreeSet<RecordIdPair>,
    pub possible_matches: BTreeSet<RecordIdPair>,
}

impl ClassificationPartition {
    pub fn new(
        matches: BTreeSet<RecordIdPair>,
        non_matches: BTreeSet<RecordIdPair>,
        possible_matches: BTreeSet<RecordIdPair>,
    ) -> Self {
        Self { matches, non_matches, possible_matches }
    }

    pub fn len(&self) -> usize {
        self.matches.len() + self.non_matches.len() + self.possible_matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Class of a pair. Pairs in neither the match nor the non-match set are
    /// possible matches.
    pub fn class_of(&self, pair: &RecordIdPair) -> MatchClass {
        if self.matches.contains(pair) {
            MatchClass::Match
        } else if self.non_matches.contains(pair) {
            MatchClass::NonMatch
        } else {
            MatchClass::PossibleMatch
        }
    }

    /// The three sets must be pairwise disjoint and together hold exactly the
    /// keys of `mapping`.
    pub fn validate(&self, mapping: &WeightVectorMap) -> Result<(), OutputError> {
        if self.len() != mapping.len() {
            return Err(OutputError::Validation(format!(
                "weight vectors hold {} pair(s) but the match sets hold {} in total",
                mapping.len(),
                self.len()
            )));
        }

        let sets = [
            ("match", &self.matches),
            ("non-match", &self.non_matches),
            ("possible-match", &self.possible_matches),
        ];

        for (i, (name_a, set_a)) in sets.iter().enumerate() {
            for (name_b, set_b) in &sets[i + 1..] {
                if let Some(pair) = set_a.intersection(set_b).next() {
                    return Err(OutputError::Validation(format!(
                        "pair {pair} is in both the {name_a} and the {name_b} set"
                    )));
                }
            }
            if let Some(pair) = set_a.iter().find(|p| !mapping.contains_key(*p)) {
                return Err(OutputError::Validation(format!(
                    "pair {pair} in the {name_a} set has no weight vector"
                )));
            }
        }

        Ok(())
    }
}

/// Load a set of record pairs from a two-column CSV file without header.
/// A `.gz` sibling is preferred when present.
pub fn load_pair_set(path: &Path) -> Result<BTreeSet<RecordIdPair>, OutputError> {
    let path = compress::resolve_compressed(path);
    let input = compress::open_input(&path).map_err(|e| OutputError::io(&path, e))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut pairs = BTreeSet::new();
    for record in reader.records() {
        let record = record.map_err(|e| OutputError::format(&path, e))?;
        if record.len() < 2 {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(OutputError::format(
                &path,
                format!("line {line}: expected two record identifiers"),
            ));
        }
        if !pairs.insert(RecordIdPair::new(&record[0], &record[1])) {
            log::warn!(
                "{}: pair ({}, {}) listed more than once",
                path.display(),
                &record[0],
                &record[1]
            );
        }
    }

    Ok(pairs)
}
