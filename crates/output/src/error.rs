use std::fmt;
use std::path::Path;

use reclink_io::DatasetError;

#[derive(Debug)]
pub enum OutputError {
    /// Bad argument or inconsistent input (bin width, partition mismatch, ...).
    Validation(String),
    /// File could not be opened, created or written.
    Io { path: String, message: String },
    /// A weight value could not be read as a number.
    Parse { path: String, line: u64, value: String },
    /// Structurally malformed delimited file (missing header, ragged rows).
    Format { path: String, message: String },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (missing section, bad bin width, etc.).
    ConfigValidation(String),
    /// A matched pair has no weight vector.
    UnknownPair { id1: String, id2: String },
    /// Failure inside the dataset layer.
    Dataset(DatasetError),
}

impl OutputError {
    pub fn io(path: &Path, err: impl fmt::Display) -> Self {
        Self::Io { path: path.display().to_string(), message: err.to_string() }
    }

    pub fn format(path: &Path, err: impl fmt::Display) -> Self {
        Self::Format { path: path.display().to_string(), message: err.to_string() }
    }
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "validation error: {msg}"),
            Self::Io { path, message } => write!(f, "IO error on '{path}': {message}"),
            Self::Parse { path, line, value } => {
                write!(f, "'{path}' line {line}: cannot parse weight '{value}'")
            }
            Self::Format { path, message } => write!(f, "'{path}': malformed file: {message}"),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::UnknownPair { id1, id2 } => {
                write!(f, "matched pair ({id1}, {id2}) has no weight vector")
            }
            Self::Dataset(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Dataset(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DatasetError> for OutputError {
    fn from(err: DatasetError) -> Self {
        Self::Dataset(err)
    }
}
