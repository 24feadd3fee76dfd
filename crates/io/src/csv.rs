// CSV dataset import/export

use std::path::{Path, PathBuf};

use crate::compress::{self, OutputStream};
use crate::dataset::{record_id, Column, CsvFields, Dataset, FieldLayout, Record, RecordIter};
use crate::error::DatasetError;

/// Record terminator matching the platform's text convention.
pub fn platform_terminator() -> csv::Terminator {
    if cfg!(windows) {
        csv::Terminator::CRLF
    } else {
        csv::Terminator::Any(b'\n')
    }
}

/// A delimited-text dataset whose fields name explicit column offsets.
#[derive(Debug, Clone)]
pub struct CsvDataset {
    pub description: String,
    pub path: PathBuf,
    pub rec_ident: String,
    pub fields: CsvFields,
    pub delimiter: u8,
    pub header_line: bool,
    pub strip_fields: bool,
    /// Prefix for synthesised record ids when `rec_ident` is not a declared field.
    pub rec_id_prefix: String,
}

impl CsvDataset {
    pub fn new(
        description: impl Into<String>,
        path: impl Into<PathBuf>,
        rec_ident: impl Into<String>,
        fields: Vec<Column>,
    ) -> Self {
        Self {
            description: description.into(),
            path: path.into(),
            rec_ident: rec_ident.into(),
            fields: CsvFields(fields),
            delimiter: b',',
            header_line: true,
            strip_fields: true,
            rec_id_prefix: String::new(),
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
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
}

impl Dataset for CsvDataset {
    fn description(&self) -> &str {
        &self.description
    }

    fn rec_ident(&self) -> &str {
        &self.rec_ident
    }

    fn layout(&self) -> &dyn FieldLayout {
        &self.fields
    }

    fn delimiter(&self) -> u8 {
        self.delimiter
    }

    fn records(&self) -> Result<RecordIter<'_>, DatasetError> {
        let input = compress::open_input(&self.path).map_err(|e| DatasetError::open(&self.path, e))?;

        let reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.header_line)
            .flexible(true)
            .from_reader(input);

        let columns = self.fields.columns();
        let ident_pos = columns.iter().position(|c| c.name == self.rec_ident);

        let iter = reader.into_records().enumerate().map(move |(row, result)| {
            let record = result.map_err(|e| DatasetError::read(&self.path, e))?;
            let values: Vec<String> = columns
                .iter()
                .map(|c| {
                    let raw = record.get(c.offset).unwrap_or("");
                    let value = if self.strip_fields { raw.trim() } else { raw };
                    value.to_string()
                })
                .collect();
            let rec_id = record_id(ident_pos, &values, &self.rec_id_prefix, row);
            Ok(Record { rec_id, values })
        });

        Ok(Box::new(iter))
    }
}

/// Write-mode CSV dataset. Every value lands at its column's offset; gaps
/// between declared offsets are written as empty fields.
pub struct CsvDatasetWriter {
    path: PathBuf,
    description: String,
    columns: Vec<Column>,
    width: usize,
    writer: csv::Writer<OutputStream>,
    rows: usize,
}

impl CsvDatasetWriter {
    pub fn create(
        path: &Path,
        description: impl Into<String>,
        columns: Vec<Column>,
        delimiter: u8,
        write_header: bool,
    ) -> Result<Self, DatasetError> {
        if columns.is_empty() {
            return Err(DatasetError::Schema(format!(
                "output dataset '{}' has no fields",
                path.display()
            )));
        }
        let mut offsets: Vec<usize> = columns.iter().map(|c| c.offset).collect();
        offsets.sort_unstable();
        if let Some(pair) = offsets.windows(2).find(|w| w[0] == w[1]) {
            return Err(DatasetError::Schema(format!(
                "output dataset '{}' has two fields at column {}",
                path.display(),
                pair[0]
            )));
        }

        let stream = compress::create_output(path).map_err(|e| DatasetError::open(path, e))?;
        let writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .terminator(platform_terminator())
            .from_writer(stream);

        let width = columns.iter().map(|c| c.offset + 1).max().unwrap_or(0);

        let mut this = Self {
            path: path.to_path_buf(),
            description: description.into(),
            columns,
            width,
            writer,
            rows: 0,
        };

        if write_header {
            let names: Vec<String> = this.columns.iter().map(|c| c.name.clone()).collect();
            this.write_placed(&names)?;
        }

        Ok(this)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Write one row; `values` are in field-list order.
    pub fn write(&mut self, values: &[String]) -> Result<(), DatasetError> {
        if values.len() != self.columns.len() {
            return Err(DatasetError::Schema(format!(
                "'{}': row has {} values, expected {}",
                self.path.display(),
                values.len(),
                self.columns.len()
            )));
        }
        self.write_placed(values)?;
        self.rows += 1;
        Ok(())
    }

    fn write_placed(&mut self, values: &[String]) -> Result<(), DatasetError> {
        let mut row = vec![""; self.width];
        for (col, value) in self.columns.iter().zip(values) {
            row[col.offset] = value.as_str();
        }
        self.writer
            .write_record(&row)
            .map_err(|e| DatasetError::write(&self.path, e))
    }

    /// Flush and close the file. Returns the number of data rows written.
    pub fn finalise(self) -> Result<usize, DatasetError> {
        let stream = self
            .writer
            .into_inner()
            .map_err(|e| DatasetError::write(&self.path, e.error()))?;
        stream.finish().map_err(|e| DatasetError::write(&self.path, e))?;
        log::info!("wrote {} record(s) to {}", self.rows, self.path.display());
        Ok(self.rows)
    }
}
