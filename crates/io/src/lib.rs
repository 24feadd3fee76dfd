// Dataset I/O operations

pub mod compress;
pub mod csv;
pub mod dataset;
pub mod error;
pub mod fixed;

pub use dataset::{Column, CsvFields, Dataset, FieldLayout, FixedWidthField, FixedWidthFields, Record, RecordIter};
pub use error::DatasetError;

/// Line terminator used for every text file this workspace writes.
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";
