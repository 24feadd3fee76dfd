use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::model::{LinkMode, RecordIdPair};

/// Zero-padding width for `count` identifiers: `max(1, ceil(log10(count)))`.
///
/// Numbers wider than this (e.g. `mid10` of 10) are printed in full.
pub fn digit_width(count: usize) -> usize {
    let mut width = 0;
    let mut power: usize = 1;
    while power < count {
        power = power.saturating_mul(10);
        width += 1;
    }
    width.max(1)
}

/// `mid` followed by a zero-padded sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    pub fn new(number: usize, width: usize) -> Self {
        Self(format!("mid{number:0width$}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Give every matched pair its identifier, in ascending pair order,
/// numbered from 1.
pub fn assign_match_ids<'a, I>(match_set: I) -> Vec<(RecordIdPair, MatchId)>
where
    I: IntoIterator<Item = &'a RecordIdPair>,
{
    let mut pairs: Vec<&RecordIdPair> = match_set.into_iter().collect();
    pairs.sort();
    pairs.dedup();

    let width = digit_width(pairs.len());
    pairs
        .into_iter()
        .enumerate()
        .map(|(i, pair)| (pair.clone(), MatchId::new(i + 1, width)))
        .collect()
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

/// Record id → identifiers of the matches that record takes part in, in
/// assignment order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipIndex {
    entries: HashMap<String, Vec<MatchId>>,
}

impl MembershipIndex {
    pub fn push(&mut self, rec_id: &str, mid: MatchId) {
        self.entries.entry(rec_id.to_string()).or_default().push(mid);
    }

    /// Identifiers for `rec_id`; empty for unmatched records.
    pub fn get(&self, rec_id: &str) -> &[MatchId] {
        self.entries.get(rec_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Identifiers for `rec_id` joined with `;`.
    pub fn joined(&self, rec_id: &str) -> String {
        self.get(rec_id)
            .iter()
            .map(MatchId::as_str)
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Matched records in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[MatchId])> {
        self.entries.iter().map(|(id, mids)| (id.as_str(), mids.as_slice()))
    }

    /// Number of distinct records with at least one match.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Membership indices for one run. Deduplication shares a single index
/// between both endpoints of every pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Membership {
    Shared(MembershipIndex),
    Split { first: MembershipIndex, second: MembershipIndex },
}

impl Membership {
    pub fn mode(&self) -> LinkMode {
        match self {
            Self::Shared(_) => LinkMode::Deduplication,
            Self::Split { .. } => LinkMode::Linkage,
        }
    }

    pub fn first(&self) -> &MembershipIndex {
        match self {
            Self::Shared(index) => index,
            Self::Split { first, .. } => first,
        }
    }

    /// Index for the second dataset; the shared index in deduplication mode.
    pub fn second(&self) -> &MembershipIndex {
        match self {
            Self::Shared(index) => index,
            Self::Split { second, .. } => second,
        }
    }
}

/// Build membership indices from already-assigned identifiers.
pub fn build_membership(assigned: &[(RecordIdPair, MatchId)], mode: LinkMode) -> Membership {
    match mode {
        LinkMode::Deduplication => {
            let mut index = MembershipIndex::default();
            record_endpoints(assigned, &mut index, None);
            Membership::Shared(index)
        }
        LinkMode::Linkage => {
            let mut first = MembershipIndex::default();
            let mut second = MembershipIndex::default();
            record_endpoints(assigned, &mut first, Some(&mut second));
            Membership::Split { first, second }
        }
    }
}

/// Assign identifiers to `match_set` and index them per record.
pub fn assign<'a, I>(match_set: I, mode: LinkMode) -> Membership
where
    I: IntoIterator<Item = &'a RecordIdPair>,
{
    build_membership(&assign_match_ids(match_set), mode)
}

/// `id1` always goes to `first`; `id2` goes to `second` when given, else
/// to `first` as well.
fn record_endpoints(
    assigned: &[(RecordIdPair, MatchId)],
    first: &mut MembershipIndex,
    mut second: Option<&mut MembershipIndex>,
) {
    for (pair, mid) in assigned {
        first.push(&pair.id1, mid.clone());
        match second.as_deref_mut() {
            Some(index) => index.push(&pair.id2, mid.clone()),
            None => first.push(&pair.id2, mid.clone()),
        }
    }
}
