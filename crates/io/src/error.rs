use std::fmt;
use std::path::Path;

#[derive(Debug)]
pub enum DatasetError {
    /// File could not be opened or created.
    Open { path: String, message: String },
    /// Malformed or unreadable record while streaming a dataset.
    Read { path: String, message: String },
    /// Write or flush failure on an output dataset.
    Write { path: String, message: String },
    /// Field list / row shape problem (wrong value count, empty field list).
    Schema(String),
}

impl DatasetError {
    pub fn open(path: &Path, err: impl fmt::Display) -> Self {
        Self::Open { path: path.display().to_string(), message: err.to_string() }
    }

    pub fn read(path: &Path, err: impl fmt::Display) -> Self {
        Self::Read { path: path.display().to_string(), message: err.to_string() }
    }

    pub fn write(path: &Path, err: impl fmt::Display) -> Self {
        Self::Write { path: path.display().to_string(), message: err.to_string() }
    }
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, message } => write!(f, "cannot open '{path}': {message}"),
            Self::Read { path, message } => write!(f, "cannot read '{path}': {message}"),
            Self::Write { path, message } => write!(f, "cannot write '{path}': {message}"),
            Self::Schema(msg) => write!(f, "schema error: {msg}"),
        }
    }
}

impl std::error::Error for DatasetError {}
