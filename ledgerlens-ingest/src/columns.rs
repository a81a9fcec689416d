//! Column names of the bank export and of the appended annotation columns.

pub const SERIAL: &str = "S No.";
pub const DATE: &str = "Transaction Date";
pub const REMARKS: &str = "Transaction Remarks";
pub const WITHDRAWAL: &str = "Withdrawal Amount(INR)";
pub const DEPOSIT: &str = "Deposit Amount(INR)";
pub const BALANCE: &str = "Balance(INR)";

/// Columns every input statement must carry
pub const REQUIRED: [&str; 6] = [SERIAL, DATE, REMARKS, WITHDRAWAL, DEPOSIT, BALANCE];

pub const CLEANED_REMARK: &str = "Cleaned Remark";
pub const NOTES: &str = "Notes / Doubts";
pub const CATEGORY: &str = "Category";
pub const SUBCATEGORY: &str = "Subcategory";
pub const CONFIDENCE: &str = "Confidence";

/// Columns appended to the output, in write order
pub const ANNOTATIONS: [&str; 5] = [CLEANED_REMARK, NOTES, CATEGORY, SUBCATEGORY, CONFIDENCE];

/// Position of every required column within a header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ColumnMap {
    pub serial: usize,
    pub date: usize,
    pub remarks: usize,
    pub withdrawal: usize,
    pub deposit: usize,
    pub balance: usize,
}

impl ColumnMap {
    /// Resolve required columns, or return the names that are missing.
    pub fn resolve(headers: &[String]) -> Result<Self, Vec<String>> {
        let mut missing = Vec::new();
        let mut find = |name: &str| {
            let pos = position(headers, name);
            if pos.is_none() {
                missing.push(name.to_string());
            }
            pos.unwrap_or(0)
        };

        let map = ColumnMap {
            serial: find(SERIAL),
            date: find(DATE),
            remarks: find(REMARKS),
            withdrawal: find(WITHDRAWAL),
            deposit: find(DEPOSIT),
            balance: find(BALANCE),
        };

        if missing.is_empty() { Ok(map) } else { Err(missing) }
    }
}

/// Case-sensitive match on trimmed header text
pub(crate) fn position(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

/// Last match, for columns we append after the input's own columns
pub(crate) fn rposition(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().rposition(|h| h.trim() == name)
}
