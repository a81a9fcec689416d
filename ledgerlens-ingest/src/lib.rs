//! ledgerlens-ingest: bank statement loading (CSV or spreadsheet) and annotated table I/O.

pub mod annotated;
pub mod columns;
pub mod error;
pub mod statement;
pub mod values;
mod workbook;

pub use annotated::{load_annotated, read_annotated, save_annotated, write_annotated};
pub use error::IngestError;
pub use statement::{load_statement, read_statement};
