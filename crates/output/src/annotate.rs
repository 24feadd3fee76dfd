// Annotated copies of the source datasets with a match-identifier column

use std::path::{Path, PathBuf};

use reclink_io::csv::CsvDatasetWriter;
use reclink_io::{Column, Dataset, FieldLayout};
use serde::Serialize;

use crate::error::OutputError;
use crate::match_id::{assign, MembershipIndex};
use crate::model::{LinkMode, RecordIdPair};

/// Field list of an annotated output dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugmentedSchema {
    pub columns: Vec<Column>,
    /// True when the record identifier was not a declared field and had to
    /// be appended.
    pub adds_rec_ident: bool,
}

impl AugmentedSchema {
    /// Declared fields, then the record identifier (only if undeclared), then
    /// the match-identifier field, at consecutive offsets after the last
    /// declared field.
    pub fn derive(layout: &dyn FieldLayout, rec_ident: &str, match_id_field: &str) -> Self {
        let mut columns = layout.columns();
        let mut next = layout.next_offset();

        let adds_rec_ident = !layout.declares(rec_ident);
        if adds_rec_ident {
            columns.push(Column::new(rec_ident, next));
            next += 1;
        }
        columns.push(Column::new(match_id_field, next));

        Self { columns, adds_rec_ident }
    }

    pub fn match_id_column(&self) -> &Column {
        // derive() always appends it last
        &self.columns[self.columns.len() - 1]
    }
}

/// Result of writing one annotated dataset.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotateSummary {
    pub path: PathBuf,
    pub description: String,
    pub records: usize,
    pub matched_records: usize,
    pub added_rec_ident: bool,
}

/// Stream `dataset` into a CSV copy at `output`, appending each record's
/// match identifiers (`;`-joined, empty when unmatched).
pub fn write_annotated(
    dataset: &dyn Dataset,
    index: &MembershipIndex,
    match_id_field: &str,
    output: &Path,
) -> Result<AnnotateSummary, OutputError> {
    if match_id_field.is_empty() {
        return Err(OutputError::Validation("match identifier field name is empty".into()));
    }

    let schema = AugmentedSchema::derive(dataset.layout(), dataset.rec_ident(), match_id_field);
    let description = format!("{} with match identifiers", dataset.description());

    // open the source first so a missing input leaves no output behind
    let records = dataset.records()?;
    let mut writer = CsvDatasetWriter::create(
        output,
        description.clone(),
        schema.columns.clone(),
        dataset.delimiter(),
        true,
    )?;

    let mut matched_records = 0;
    for record in records {
        let record = record?;
        let mut values = record.values;
        if schema.adds_rec_ident {
            values.push(record.rec_id.clone());
        }

        let mids = index.joined(&record.rec_id);
        if !mids.is_empty() {
            matched_records += 1;
        }
        values.push(mids);

        writer.write(&values)?;
    }

    let records = writer.finalise()?;

    Ok(AnnotateSummary {
        path: output.to_path_buf(),
        description,
        records,
        matched_records,
        added_rec_ident: schema.adds_rec_ident,
    })
}

/// A dataset to annotate and where its copy goes.
pub struct DatasetTarget<'a> {
    pub dataset: &'a dyn Dataset,
    pub match_id_field: &'a str,
    pub output: &'a Path,
}

/// Assign match identifiers and write annotated copies. A second target
/// means linkage (two copies); without one the run is a deduplication.
pub fn save_match_datasets<'a, I>(
    match_set: I,
    first: DatasetTarget<'_>,
    second: Option<DatasetTarget<'_>>,
) -> Result<Vec<AnnotateSummary>, OutputError>
where
    I: IntoIterator<Item = &'a RecordIdPair>,
{
    let mode = if second.is_some() { LinkMode::Linkage } else { LinkMode::Deduplication };
    let membership = assign(match_set, mode);

    let mut summaries = vec![write_annotated(
        first.dataset,
        membership.first(),
        first.match_id_field,
        first.output,
    )?];

    if let Some(second) = second {
        summaries.push(write_annotated(
            second.dataset,
            membership.second(),
            second.match_id_field,
            second.output,
        )?);
    }

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use reclink_io::csv::CsvDataset;
    use reclink_io::{CsvFields, FixedWidthField, FixedWidthFields};

    use super::*;

    #[test]
    fn schema_keeps_declared_ident() {
        let layout = CsvFields(vec![Column::new("rec_id", 0), Column::new("surname", 1)]);
        let schema = AugmentedSchema::derive(&layout, "rec_id", "match_id");
        assert!(!schema.adds_rec_ident);
        assert_eq!(
            schema.columns,
            vec![Column::new("rec_id", 0), Column::new("surname", 1), Column::new("match_id", 2)]
        );
    }

    #[test]
    fn schema_appends_undeclared_ident_then_match_id() {
        let layout = CsvFields(vec![Column::new("surname", 0), Column::new("given", 4)]);
        let schema = AugmentedSchema::derive(&layout, "rec_id", "mid");
        assert!(schema.adds_rec_ident);
        assert_eq!(schema.columns.len(), 4);
        assert_eq!(schema.columns[2], Column::new("rec_id", 5));
        assert_eq!(schema.columns[3], Column::new("mid", 6));
        assert_eq!(schema.match_id_column(), &Column::new("mid", 6));
    }

    #[test]
    fn schema_for_fixed_width_uses_declaration_indices() {
        let layout = FixedWidthFields(vec![
            FixedWidthField { name: "surname".into(), width: 10 },
            FixedWidthField { name: "postcode".into(), width: 4 },
        ]);
        let schema = AugmentedSchema::derive(&layout, "rec_id", "match_id");
        assert_eq!(
            schema.columns,
            vec![
                Column::new("surname", 0),
                Column::new("postcode", 1),
                Column::new("rec_id", 2),
                Column::new("match_id", 3),
            ]
        );
    }

    #[test]
    fn deduplication_writes_one_annotated_copy() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("people.csv");
        std::fs::write(&src, "rec_id,surname\nr1,smith\nr2,smyth\nr3,smithe\nr4,jones\n").unwrap();
        let out = dir.path().join("people_mid.csv");

        let ds = CsvDataset::new(
            "people",
            &src,
            "rec_id",
            vec![Column::new("rec_id", 0), Column::new("surname", 1)],
        );
        let matches = BTreeSet::from([RecordIdPair::new("r1", "r2"), RecordIdPair::new("r2", "r3")]);

        let summaries = save_match_datasets(
            &matches,
            DatasetTarget { dataset: &ds, match_id_field: "match_id", output: &out },
            None,
        )
        .unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].records, 4);
        assert_eq!(summaries[0].matched_records, 3);
        assert_eq!(summaries[0].description, "people with match identifiers");

        let text = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "rec_id,surname,match_id",
                "r1,smith,mid1",
                "r2,smyth,mid1;mid2",
                "r3,smithe,mid2",
                "r4,jones,",
            ]
        );
    }

    #[test]
    fn empty_match_field_is_rejected() {
        let ds = CsvDataset::new("x", "unused.csv", "id", vec![Column::new("id", 0)]);
        let err = write_annotated(&ds, &MembershipIndex::default(), "", Path::new("o.csv")).unwrap_err();
        assert!(matches!(err, OutputError::Validation(_)));
    }
}
