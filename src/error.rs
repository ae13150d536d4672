//! # Error types surfaced by the `starcall` library
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while loading definitions, reading a sample
/// file, or configuring a call. Per-gene conditions (no sample data, zero
/// matches) are not errors and are reported inside the result instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or internally inconsistent allele definition. The store that
    /// produced this is unusable.
    #[error("failed to load allele definition {}: {}", .path.display(), .reason)]
    DefinitionLoad { path: PathBuf, reason: String },

    /// Malformed line in the sample variant file.
    #[error("malformed variant record at line {line}: {reason}")]
    VariantParse { line: u64, reason: String },

    /// Input path does not exist or is not a regular file.
    #[error("input file {} does not exist or is not a regular file", .path.display())]
    MissingInput { path: PathBuf },

    /// Unknown value for an enumerated configuration option.
    #[error("unsupported value '{value}' for {option}")]
    Configuration { option: &'static str, value: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
