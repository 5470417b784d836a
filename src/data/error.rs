//! Failure kinds for the column reader and writer.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("File {} does not exist.", path.display())]
    NotFound { path: PathBuf },

    #[error("Invalid delimiter pattern '{pattern}': {reason}")]
    InvalidDelimiter { pattern: String, reason: String },

    #[error("No valid columns found for file {}.", path.display())]
    NoValidColumns { path: PathBuf },

    #[error("Column name '{name}' appears more than once in the header")]
    DuplicateHeader { name: String },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Error: columns not all same length.")]
    RaggedColumns { lengths: Vec<usize> },

    #[error("Error: length of header, {header}, does not match number of columns, {columns}.")]
    HeaderLength { header: usize, columns: usize },

    #[error("Column name '{name}' appears more than once in the header")]
    DuplicateHeader { name: String },

    #[error("File '{}' already exists and overwrite is set to False. Halting...", path.display())]
    Exists { path: PathBuf },

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
