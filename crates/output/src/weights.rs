// Weight-vector files: `id1,id2,w1,...,wn` with a header row

use std::io::{Read, Write};
use std::path::Path;

use reclink_io::compress;
use reclink_io::csv::platform_terminator;

use crate::error::OutputError;
use crate::model::{RecordIdPair, WeightVectorMap};

/// Decoded weight-vector file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightVectorFile {
    /// Comparison field names, in column order.
    pub field_names: Vec<String>,
    pub vectors: WeightVectorMap,
}

impl WeightVectorFile {
    pub fn dimensions(&self) -> usize {
        self.field_names.len()
    }
}

/// Load a weight-vector file, preferring a `.gz` sibling when one exists.
pub fn load_weight_vectors(path: &Path) -> Result<WeightVectorFile, OutputError> {
    let path = compress::resolve_compressed(path);
    let input = compress::open_input(&path).map_err(|e| OutputError::io(&path, e))?;
    let file = read_weight_vectors(input, &path)?;
    log::info!(
        "loaded {} weight vector(s) with {} field(s) from {}",
        file.vectors.len(),
        file.field_names.len(),
        path.display()
    );
    Ok(file)
}

/// Decode a weight-vector stream. `path` is only used in error messages.
pub fn read_weight_vectors<R: Read>(input: R, path: &Path) -> Result<WeightVectorFile, OutputError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(input);

    let header = reader.headers().map_err(|e| OutputError::format(path, e))?;
    if header.len() < 2 {
        return Err(OutputError::format(
            path,
            "header must name two record identifier columns",
        ));
    }
    let field_names: Vec<String> = header.iter().skip(2).map(|h| h.to_string()).collect();

    let mut vectors = WeightVectorMap::new();

    for record in reader.records() {
        let record = record.map_err(|e| OutputError::format(path, e))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let key = RecordIdPair::new(&record[0], &record[1]);

        let mut vector = Vec::with_capacity(field_names.len());
        for raw in record.iter().skip(2) {
            let w: f64 = raw.trim().parse().map_err(|_| OutputError::Parse {
                path: path.display().to_string(),
                line,
                value: raw.to_string(),
            })?;
            vector.push(w);
        }

        if let Some(_previous) = vectors.insert(key, vector) {
            log::warn!(
                "{} line {line}: record pair ({}, {}) already loaded, keeping the later vector",
                path.display(),
                &record[0],
                &record[1]
            );
        }
    }

    Ok(WeightVectorFile { field_names, vectors })
}

/// Write a weight-vector file; gzip-compressed when `path` ends in `.gz`.
pub fn save_weight_vectors(
    path: &Path,
    id_fields: [&str; 2],
    file: &WeightVectorFile,
) -> Result<(), OutputError> {
    let stream = compress::create_output(path).map_err(|e| OutputError::io(path, e))?;
    let stream = write_weight_vectors(stream, id_fields, file).map_err(|e| OutputError::io(path, e))?;
    stream.finish().map_err(|e| OutputError::io(path, e))?;
    log::info!("wrote {} weight vector(s) to {}", file.vectors.len(), path.display());
    Ok(())
}

/// Encode into any writer and hand the writer back once flushed.
pub fn write_weight_vectors<W: Write>(
    output: W,
    id_fields: [&str; 2],
    file: &WeightVectorFile,
) -> Result<W, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(platform_terminator())
        .from_writer(output);

    let mut header: Vec<&str> = id_fields.to_vec();
    header.extend(file.field_names.iter().map(String::as_str));
    writer.write_record(&header)?;

    for (pair, vector) in &file.vectors {
        let mut row = Vec::with_capacity(vector.len() + 2);
        row.push(pair.id1.clone());
        row.push(pair.id2.clone());
        row.extend(vector.iter().map(|w| w.to_string()));
        writer.write_record(&row)?;
    }

    writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}
