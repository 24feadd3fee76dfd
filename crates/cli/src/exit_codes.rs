//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                                    |
//! |------|------------------------------------------------------------|
//! | 0    | Success                                                    |
//! | 1    | General error (unspecified)                                |
//! | 2    | CLI usage error (bad args)                                 |
//! | 3    | I/O error (missing input, unwritable output)               |
//! | 4    | Parse error (bad weight value, malformed delimited file)   |
//! | 5    | Validation error (job config, partition, unknown pair)     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Map it in `output_exit_code`

use reclink_io::DatasetError;
use reclink_output::OutputError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// A file could not be opened, read, created or written.
pub const EXIT_IO: u8 = 3;

/// Input content could not be parsed (weights, pair lists, datasets).
pub const EXIT_PARSE: u8 = 4;

/// Job config invalid, classification inconsistent with the weights, or a
/// matched pair without a weight vector.
pub const EXIT_VALIDATION: u8 = 5;

/// Map an `OutputError` to its exit code.
pub fn output_exit_code(err: &OutputError) -> u8 {
    match err {
        OutputError::Io { .. } => EXIT_IO,
        OutputError::Parse { .. } | OutputError::Format { .. } => EXIT_PARSE,
        OutputError::Validation(_)
        | OutputError::ConfigParse(_)
        | OutputError::ConfigValidation(_)
        | OutputError::UnknownPair { .. } => EXIT_VALIDATION,
        OutputError::Dataset(inner) => match inner {
            DatasetError::Open { .. } | DatasetError::Write { .. } => EXIT_IO,
            DatasetError::Read { .. } => EXIT_PARSE,
            DatasetError::Schema(_) => EXIT_VALIDATION,
        },
    }
}
