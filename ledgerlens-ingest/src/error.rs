use std::path::PathBuf;
use thiserror::Error;

/// Input validation failures. All of them are fatal and raised before any
/// model call is made.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("statement has no header row")]
    Empty,

    #[error("no worksheet in {}", .0.display())]
    NoWorksheet(PathBuf),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;
