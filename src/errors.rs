use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a whole merge run.
/// Anything row- or file-scoped degrades instead and never reaches here.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("no input files were configured")]
    NoInputs,

    #[error("could not create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
}

/// A source export that could not be turned into records.
/// The run skips that file and carries on with the rest.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("cannot open workbook {path}: {message}")]
    Open { path: PathBuf, message: String },

    #[error("workbook {path} has no worksheet at index {index}")]
    NoSheet { path: PathBuf, index: usize },

    #[error("could not find '{marker}' header row in {path}")]
    HeaderNotFound { path: PathBuf, marker: String },
}
