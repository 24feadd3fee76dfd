// Dataset abstraction shared by every on-disk flavour

use crate::error::DatasetError;

/// A named column at a 0-based position in a delimited row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub offset: usize,
}

impl Column {
    pub fn new(name: impl Into<String>, offset: usize) -> Self {
        Self { name: name.into(), offset }
    }
}

/// One row read from a dataset.
///
/// `values` are in field-list order, one per declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub rec_id: String,
    pub values: Vec<String>,
}

/// Uniform view over a dataset's declared fields, regardless of how the
/// on-disk flavour describes them.
pub trait FieldLayout {
    /// Declared fields as ordered `(name, offset)` pairs.
    fn columns(&self) -> Vec<Column>;

    /// First column offset available after the declared fields.
    fn next_offset(&self) -> usize;

    fn declares(&self, name: &str) -> bool {
        self.columns().iter().any(|c| c.name == name)
    }
}

/// Delimited-text fields: each carries an explicit column offset.
#[derive(Debug, Clone, Default)]
pub struct CsvFields(pub Vec<Column>);

impl FieldLayout for CsvFields {
    fn columns(&self) -> Vec<Column> {
        self.0.clone()
    }

    /// One past the *last declared* field, not the widest one.
    fn next_offset(&self) -> usize {
        self.0.last().map(|c| c.offset + 1).unwrap_or(0)
    }
}

/// A fixed-width field: name plus width in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedWidthField {
    pub name: String,
    pub width: usize,
}

/// Fixed-width fields: offsets are derived from declaration order.
#[derive(Debug, Clone, Default)]
pub struct FixedWidthFields(pub Vec<FixedWidthField>);

impl FieldLayout for FixedWidthFields {
    fn columns(&self) -> Vec<Column> {
        self.0
            .iter()
            .enumerate()
            .map(|(i, f)| Column::new(f.name.clone(), i))
            .collect()
    }

    fn next_offset(&self) -> usize {
        self.0.len()
    }
}

pub type RecordIter<'a> = Box<dyn Iterator<Item = Result<Record, DatasetError>> + 'a>;

/// Read side of a tabular dataset.
pub trait Dataset {
    fn description(&self) -> &str;

    /// Name of the record-identifier field. It may or may not be declared.
    fn rec_ident(&self) -> &str;

    fn layout(&self) -> &dyn FieldLayout;

    /// Delimiter used when an annotated copy of this dataset is written.
    fn delimiter(&self) -> u8 {
        b','
    }

    /// Stream every record in native file order.
    fn records(&self) -> Result<RecordIter<'_>, DatasetError>;
}

/// Record id for a row: the value of the `rec_ident` field when it is
/// declared, otherwise `<prefix><row index>`.
pub(crate) fn record_id(
    ident_pos: Option<usize>,
    values: &[String],
    prefix: &str,
    row: usize,
) -> String {
    match ident_pos.and_then(|i| values.get(i)) {
        Some(v) => v.clone(),
        None => format!("{prefix}{row}"),
    }
}
