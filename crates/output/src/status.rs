// Match-status export: rec_id1,rec_id2,summed_weight,match_identifier

use std::path::Path;

use reclink_io::compress;
use reclink_io::csv::platform_terminator;

use crate::error::OutputError;
use crate::match_id::{assign_match_ids, MatchId};
use crate::model::{weight_sum, RecordIdPair, WeightVectorMap};

/// One exported row.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchStatusRow {
    pub pair: RecordIdPair,
    pub weight: f64,
    pub match_id: MatchId,
}

/// Rows for every matched pair, in identifier order. Fails if a matched pair
/// has no weight vector.
pub fn match_status_rows<'a, I>(
    mapping: &WeightVectorMap,
    match_set: I,
) -> Result<Vec<MatchStatusRow>, OutputError>
where
    I: IntoIterator<Item = &'a RecordIdPair>,
{
    assign_match_ids(match_set)
        .into_iter()
        .map(|(pair, match_id)| {
            let vector = mapping.get(&pair).ok_or_else(|| OutputError::UnknownPair {
                id1: pair.id1.clone(),
                id2: pair.id2.clone(),
            })?;
            Ok(MatchStatusRow { weight: weight_sum(vector), pair, match_id })
        })
        .collect()
}

/// Write the match-status file (no header). Returns the number of rows.
///
/// Rows are checked before the file is created, so an unknown pair leaves
/// no output behind.
pub fn save_match_status<'a, I>(
    mapping: &WeightVectorMap,
    match_set: I,
    path: &Path,
) -> Result<usize, OutputError>
where
    I: IntoIterator<Item = &'a RecordIdPair>,
{
    let rows = match_status_rows(mapping, match_set)?;

    let stream = compress::create_output(path).map_err(|e| OutputError::io(path, e))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(platform_terminator())
        .from_writer(stream);

    for row in &rows {
        let weight = format!("{:.6}", row.weight);
        writer
            .write_record([
                row.pair.id1.as_str(),
                row.pair.id2.as_str(),
                weight.as_str(),
                row.match_id.as_str(),
            ])
            .map_err(|e| OutputError::io(path, e))?;
    }

    let stream = writer.into_inner().map_err(|e| OutputError::io(path, e.error()))?;
    stream.finish().map_err(|e| OutputError::io(path, e))?;

    log::info!("wrote {} match status row(s) to {}", rows.len(), path.display());
    Ok(rows.len())
}
