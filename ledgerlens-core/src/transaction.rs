//! Statement rows as loaded from a bank export.
//!
//! A row is immutable once loaded. Processing stages never touch the raw
//! fields; they attach annotations alongside (see [`AnnotatedTransaction`]).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::annotation::{CategoryAnnotation, RemarkAnnotation};

/// One transaction record from the input table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Original sequence position (0-based), the row's stable identity
    pub index: usize,
    /// Bank serial number ("S No.") as written in the export
    pub serial: String,
    /// Transaction date, if the cell parsed as a date
    pub date: Option<NaiveDate>,
    /// Raw remark text (UPI/NEFT/IMPS reference)
    pub remarks: String,
    pub withdrawal: f64,
    pub deposit: f64,
    pub balance: f64,
    /// Every input cell in header order, passed through untouched
    pub fields: Vec<String>,
}

impl Transaction {
    /// Returns true if money left the account
    pub fn is_expense(&self) -> bool {
        self.withdrawal > 0.0
    }

    /// Returns true if money arrived in the account
    pub fn is_income(&self) -> bool {
        self.deposit > 0.0
    }

    /// Deposit minus withdrawal
    pub fn net(&self) -> f64 {
        self.deposit - self.withdrawal
    }
}

/// A parsed statement: the original header plus its rows in file order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Statement {
    pub headers: Vec<String>,
    pub transactions: Vec<Transaction>,
}

impl Statement {
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// A row together with the annotations produced by both stages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnotatedTransaction {
    pub transaction: Transaction,
    pub remark: RemarkAnnotation,
    pub category: CategoryAnnotation,
}

impl AnnotatedTransaction {
    /// Text used for categorization: the cleaned remark
    pub fn description(&self) -> &str {
        &self.remark.cleaned_remark
    }
}

/// The fully processed table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnnotatedStatement {
    /// Original input header (annotation columns are appended on write)
    pub headers: Vec<String>,
    pub rows: Vec<AnnotatedTransaction>,
}

impl AnnotatedStatement {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Earliest and latest parsed transaction dates
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.rows.iter().filter_map(|r| r.transaction.date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}
