//! Load a bank statement (CSV or spreadsheet) into typed rows.
//!
//! Exports often carry a preamble (account holder, branch, period) before
//! the real header, so rows are skipped until one contains a
//! `Transaction Remarks` cell. Fully blank rows are dropped. Every cell is
//! kept in `Transaction::fields` so extra columns survive to the output.

use ledgerlens_core::{Statement, Transaction};
use std::io;
use std::path::Path;

use crate::columns::{self, ColumnMap};
use crate::error::{IngestError, Result};
use crate::values::{parse_amount, parse_date};
use crate::workbook::read_workbook;

/// Header row plus data rows, every row exactly the header width
#[derive(Debug, Clone, Default)]
pub(crate) struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn is_blank(cells: &[String]) -> bool {
    cells.iter().all(|c| c.trim().is_empty())
}

fn trim_trailing_blanks(cells: &mut Vec<String>, keep: usize) {
    while cells.len() > keep && cells.last().is_some_and(|c| c.trim().is_empty()) {
        cells.pop();
    }
}

impl RawTable {
    /// Build a table from raw records: skip the preamble up to the
    /// `Transaction Remarks` header (falling back to the first non-blank
    /// record), drop blank rows and square every row to the header.
    ///
    /// Trailing blank cells past the header are dropped. Non-blank overflow
    /// cells get `Column N` headers so nothing shifts into the annotation
    /// columns on write.
    pub(crate) fn from_records(records: impl IntoIterator<Item = Vec<String>>) -> Result<Self> {
        let mut headers: Option<Vec<String>> = None;
        let mut first_nonblank: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for cells in records {
            if is_blank(&cells) {
                continue;
            }
            if headers.is_some() {
                rows.push(cells);
            } else if columns::position(&cells, columns::REMARKS).is_some() {
                headers = Some(cells);
            } else if first_nonblank.is_none() {
                first_nonblank = Some(cells);
            }
        }

        let Some(mut headers) = headers.or(first_nonblank) else {
            return Err(IngestError::Empty);
        };
        trim_trailing_blanks(&mut headers, 0);

        for row in &mut rows {
            trim_trailing_blanks(row, headers.len());
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(headers.len());
        if width > headers.len() {
            tracing::warn!(
                header = headers.len(),
                width,
                "rows wider than the header, naming the extra columns"
            );
            for i in headers.len()..width {
                headers.push(format!("Column {}", i + 1));
            }
        }
        for row in &mut rows {
            row.resize(width, String::new());
        }

        Ok(RawTable { headers, rows })
    }
}

pub(crate) fn read_table<R: io::Read>(reader: R) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        records.push(record.iter().map(|s| s.to_string()).collect());
    }
    RawTable::from_records(records)
}

/// Read and validate a statement from any reader.
pub fn read_statement<R: io::Read>(reader: R) -> Result<Statement> {
    let table = read_table(reader)?;
    statement_from_table(table)
}

pub(crate) fn statement_from_table(table: RawTable) -> Result<Statement> {
    let map = ColumnMap::resolve(&table.headers).map_err(IngestError::MissingColumns)?;

    let extra: Vec<&str> = table
        .headers
        .iter()
        .map(|h| h.trim())
        .filter(|h| !columns::REQUIRED.contains(h))
        .collect();
    if !extra.is_empty() {
        tracing::info!(count = extra.len(), columns = %extra.join(", "), "preserving additional columns");
    }

    let transactions = table
        .rows
        .into_iter()
        .enumerate()
        .map(|(index, fields)| to_transaction(index, fields, &map))
        .collect();

    Ok(Statement {
        headers: table.headers,
        transactions,
    })
}

fn to_transaction(index: usize, fields: Vec<String>, map: &ColumnMap) -> Transaction {
    let cell = |i: usize| fields.get(i).map(|s| s.as_str()).unwrap_or("");
    let amount = |i: usize, name: &str| {
        parse_amount(cell(i)).unwrap_or_else(|| {
            tracing::warn!(row = index + 1, column = name, value = cell(i), "unreadable amount, using 0");
            0.0
        })
    };

    let serial = cell(map.serial).trim().to_string();
    let date = parse_date(cell(map.date));
    let remarks = cell(map.remarks).trim().to_string();
    let withdrawal = amount(map.withdrawal, columns::WITHDRAWAL);
    let deposit = amount(map.deposit, columns::DEPOSIT);
    let balance = amount(map.balance, columns::BALANCE);

    Transaction {
        index,
        serial,
        date,
        remarks,
        withdrawal,
        deposit,
        balance,
        fields,
    }
}

/// Spreadsheet extensions routed through the workbook reader
const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

pub(crate) fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| WORKBOOK_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Load a statement from disk: a spreadsheet by extension, CSV otherwise.
pub fn load_statement(path: impl AsRef<Path>) -> Result<Statement> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IngestError::NotFound(path.to_path_buf()));
    }
    let statement = if is_workbook(path) {
        statement_from_table(read_workbook(path)?)?
    } else {
        read_statement(std::fs::File::open(path)?)?
    };
    tracing::debug!(path = %path.display(), rows = statement.len(), "loaded statement");
    Ok(statement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = "\
Account Name,SHAIK NIYA,,,,,
Period,01/10/2025 - 31/10/2025,,,,,
,,,,,,
S No.,Transaction Date,Transaction Remarks,Withdrawal Amount(INR),Deposit Amount(INR),Balance(INR),Branch
1,03/10/2025,UPI/SHAIK NIYA/niyazahamed5@o/temp rever/Kotak Mahi/563842971184/ICIf635d23e7afb45db8a617a6b9ea0020c,0,800,\"12,800.00\",Hyderabad
2,04/10/2025,UPI/SHAIK NIYA/niyazahamed5@o/savings oc/Kotak Mahi/563839565384/ICId2597140615b4e8daf995d05f0a9690a,\"16,500.00\",,\"-3,700.00\",Hyderabad
,,,,,,
3,05/10/2025,,120,0,\"-3,820.00\"
";

    #[test]
    fn test_skips_preamble_and_blank_rows() {
        let stmt = read_statement(SAMPLE.as_bytes()).unwrap();
        assert_eq!(stmt.headers.len(), 7);
        assert_eq!(stmt.headers[6], "Branch");
        assert_eq!(stmt.len(), 3);

        let first = &stmt.transactions[0];
        assert_eq!(first.index, 0);
        assert_eq!(first.serial, "1");
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2025, 10, 3));
        assert!(first.remarks.contains("temp rever"));
        assert_eq!(first.deposit, 800.0);
        assert_eq!(first.balance, 12800.0);
        assert_eq!(first.fields[6], "Hyderabad");
    }

    #[test]
    fn test_amount_cells() {
        let stmt = read_statement(SAMPLE.as_bytes()).unwrap();
        let second = &stmt.transactions[1];
        assert_eq!(second.withdrawal, 16500.0);
        assert_eq!(second.deposit, 0.0);
        assert_eq!(second.balance, -3700.0);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let stmt = read_statement(SAMPLE.as_bytes()).unwrap();
        let third = &stmt.transactions[2];
        assert_eq!(third.index, 2);
        assert_eq!(third.remarks, "");
        assert_eq!(third.fields.len(), 7);
        assert_eq!(third.fields[6], "");
    }

    #[test]
    fn test_missing_columns() {
        let csv = "S No.,Transaction Date,Transaction Remarks\n1,03/10/2025,UPI/x\n";
        match read_statement(csv.as_bytes()) {
            Err(IngestError::MissingColumns(cols)) => {
                assert_eq!(
                    cols,
                    vec!["Withdrawal Amount(INR)", "Deposit Amount(INR)", "Balance(INR)"]
                );
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_no_header_row_reports_all_missing() {
        let csv = "Date,Description,Amount\n02/16/2026,CLIPPER,10.00\n";
        match read_statement(csv.as_bytes()) {
            Err(IngestError::MissingColumns(cols)) => assert_eq!(cols.len(), 6),
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(read_statement("".as_bytes()), Err(IngestError::Empty)));
    }

    #[test]
    fn test_trailing_comma_rows_keep_header_width() {
        let csv = "\
S No.,Transaction Date,Transaction Remarks,Withdrawal Amount(INR),Deposit Amount(INR),Balance(INR)
1,03/10/2025,UPI/x/temp rever,0,800,100,
2,04/10/2025,UPI/y/milk,40,0,60,,
";
        let stmt = read_statement(csv.as_bytes()).unwrap();
        assert_eq!(stmt.headers.len(), 6);
        assert!(stmt.transactions.iter().all(|t| t.fields.len() == 6));
        assert_eq!(stmt.transactions[1].balance, 60.0);
    }

    #[test]
    fn test_overflow_cells_get_named_columns() {
        let csv = "\
S No.,Transaction Date,Transaction Remarks,Withdrawal Amount(INR),Deposit Amount(INR),Balance(INR),
1,03/10/2025,UPI/x,0,800,100,,branch note
2,04/10/2025,UPI/y,40,0,60
";
        let stmt = read_statement(csv.as_bytes()).unwrap();
        assert_eq!(stmt.headers.len(), 8);
        assert_eq!(stmt.headers[6], "Column 7");
        assert_eq!(stmt.headers[7], "Column 8");
        assert_eq!(stmt.transactions[0].fields[7], "branch note");
        assert_eq!(stmt.transactions[1].fields.len(), 8);
    }

    #[test]
    fn test_workbook_extension_detection() {
        assert!(is_workbook(Path::new("statement.xlsx")));
        assert!(is_workbook(Path::new("OCT.XLSX")));
        assert!(!is_workbook(Path::new("statement.csv")));
        assert!(!is_workbook(Path::new("statement")));
    }

    #[test]
    fn test_missing_file() {
        let err = load_statement("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, IngestError::NotFound(_)));
    }
}
