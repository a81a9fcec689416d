//! Spreadsheet statements (`.xlsx` and friends), read from the first sheet.
//!
//! Cells are rendered to the same text a CSV export would carry, then go
//! through the same header detection as CSV input.

use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

use crate::error::{IngestError, Result};
use crate::statement::RawTable;

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) if ts.time() == chrono::NaiveTime::MIN => ts.format("%d/%m/%Y").to_string(),
            Some(ts) => ts.format("%d/%m/%Y %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
    }
}

pub(crate) fn read_workbook(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::NoWorksheet(path.to_path_buf()))??;

    let records: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    tracing::debug!(path = %path.display(), rows = records.len(), "read worksheet");

    RawTable::from_records(records)
}
