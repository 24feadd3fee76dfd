// Fixed-width (column) dataset import

use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use crate::compress;
use crate::dataset::{record_id, Dataset, FieldLayout, FixedWidthField, FixedWidthFields, Record, RecordIter};
use crate::error::DatasetError;

/// A dataset of fixed-width lines. Fields are consecutive slices of each line,
/// `width` characters each, in declaration order.
#[derive(Debug, Clone)]
pub struct FixedWidthDataset {
    pub description: String,
    pub path: PathBuf,
    pub rec_ident: String,
    pub fields: FixedWidthFields,
    pub header_line: bool,
    pub strip_fields: bool,
    pub rec_id_prefix: String,
}

impl FixedWidthDataset {
    pub fn new(
        description: impl Into<String>,
        path: impl Into<PathBuf>,
        rec_ident: impl Into<String>,
        fields: Vec<FixedWidthField>,
    ) -> Self {
        Self {
            description: description.into(),
            path: path.into(),
            rec_ident: rec_ident.into(),
            fields: FixedWidthFields(fields),
            header_line: false,
            strip_fields: true,
            rec_id_prefix: String::new(),
        }
    }

    pub fn with_header_line(mut self, header_line: bool) -> Self {
        self.header_line = header_line;
        self
    }

    pub fn with_strip_fields(mut self, strip_fields: bool) -> Self {
        self.strip_fields = strip_fields;
        self
    }

    pub fn with_rec_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.rec_id_prefix = prefix.into();
        self
    }

    fn split_line(&self, line: &str) -> Vec<String> {
        let mut chars = line.chars();
        self.fields
            .0
            .iter()
            .map(|f| {
                let raw: String = chars.by_ref().take(f.width).collect();
                if self.strip_fields {
                    raw.trim().to_string()
                } else {
                    raw
                }
            })
            .collect()
    }
}

impl Dataset for FixedWidthDataset {
    fn description(&self) -> &str {
        &self.description
    }

    fn rec_ident(&self) -> &str {
        &self.rec_ident
    }

    fn layout(&self) -> &dyn FieldLayout {
        &self.fields
    }

    fn records(&self) -> Result<RecordIter<'_>, DatasetError> {
        let input = compress::open_input(&self.path).map_err(|e| DatasetError::open(&self.path, e))?;
        let skip = usize::from(self.header_line);
        let ident_pos = self.fields.0.iter().position(|f| f.name == self.rec_ident);

        let iter = BufReader::new(input)
            .lines()
            .skip(skip)
            .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
            .enumerate()
            .map(move |(row, line)| {
                let line = line.map_err(|e| DatasetError::read(&self.path, e))?;
                let values = self.split_line(line.trim_end_matches('\r'));
                let rec_id = record_id(ident_pos, &values, &self.rec_id_prefix, row);
                Ok(Record { rec_id, values })
            });

        Ok(Box::new(iter))
    }
}
