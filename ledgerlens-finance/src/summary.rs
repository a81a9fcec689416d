//! Summary statistics over an annotated statement.

use chrono::NaiveDate;
use ledgerlens_core::{AnnotatedStatement, Confidence};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write;

use crate::money::format_inr;

/// Per-category totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub count: usize,
    pub withdrawals: f64,
    pub deposits: f64,
}

/// Withdrawals grouped by (category, subcategory)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub category: String,
    pub subcategory: Option<String>,
    pub count: usize,
    pub withdrawals: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_transactions: usize,
    pub total_withdrawals: f64,
    pub total_deposits: f64,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Sorted by count descending, then name
    pub categories: Vec<CategoryTotal>,
    /// Non-empty subcategories with their counts, same ordering
    pub subcategories: Vec<(String, usize)>,
    /// Sorted by withdrawals descending, then names
    pub groups: Vec<GroupTotal>,
    pub low_confidence: usize,
}

impl Summary {
    pub fn from_statement(statement: &AnnotatedStatement) -> Self {
        let mut categories: HashMap<&str, CategoryTotal> = HashMap::new();
        let mut subcategories: HashMap<&str, usize> = HashMap::new();
        let mut groups: HashMap<(&str, Option<&str>), GroupTotal> = HashMap::new();

        for row in &statement.rows {
            let txn = &row.transaction;
            let cat = row.category.category.as_str();
            let sub = row.category.subcategory.as_deref();

            let total = categories.entry(cat).or_insert_with(|| CategoryTotal {
                category: cat.to_string(),
                count: 0,
                withdrawals: 0.0,
                deposits: 0.0,
            });
            total.count += 1;
            total.withdrawals += txn.withdrawal;
            total.deposits += txn.deposit;

            if let Some(sub) = sub {
                *subcategories.entry(sub).or_insert(0) += 1;
            }

            let group = groups.entry((cat, sub)).or_insert_with(|| GroupTotal {
                category: cat.to_string(),
                subcategory: sub.map(String::from),
                count: 0,
                withdrawals: 0.0,
            });
            group.count += 1;
            group.withdrawals += txn.withdrawal;
        }

        let mut categories: Vec<CategoryTotal> = categories.into_values().collect();
        categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));

        let mut subcategories: Vec<(String, usize)> = subcategories
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        subcategories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut groups: Vec<GroupTotal> = groups.into_values().collect();
        groups.sort_by(|a, b| {
            b.withdrawals
                .total_cmp(&a.withdrawals)
                .then_with(|| a.category.cmp(&b.category))
                .then_with(|| a.subcategory.cmp(&b.subcategory))
        });

        Summary {
            total_transactions: statement.len(),
            total_withdrawals: statement.rows.iter().map(|r| r.transaction.withdrawal).sum(),
            total_deposits: statement.rows.iter().map(|r| r.transaction.deposit).sum(),
            date_range: statement.date_range(),
            categories,
            subcategories,
            groups,
            low_confidence: statement
                .rows
                .iter()
                .filter(|r| r.category.confidence == Confidence::Low)
                .count(),
        }
    }

    pub fn categories_found(&self) -> usize {
        self.categories.len()
    }

    /// Withdrawal total per category, largest first
    pub fn spending_by_category(&self) -> Vec<(&str, f64)> {
        let mut out: Vec<(&str, f64)> = self
            .categories
            .iter()
            .map(|c| (c.category.as_str(), c.withdrawals))
            .collect();
        out.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        out
    }

    /// Console report block
    pub fn render(&self) -> String {
        let rule = "=".repeat(50);
        let mut s = String::new();

        let _ = writeln!(s, "\n{rule}\nPROCESSING SUMMARY\n{rule}");
        let _ = writeln!(s, "Total Transactions: {}", self.total_transactions);
        let _ = writeln!(s, "Total Withdrawals: {}", format_inr(self.total_withdrawals));
        let _ = writeln!(s, "Total Deposits: {}", format_inr(self.total_deposits));
        if let Some((start, end)) = self.date_range {
            let _ = writeln!(s, "Date Range: {start} to {end}");
        }

        let _ = writeln!(s, "\nCategories Found: {}", self.categories_found());
        if !self.categories.is_empty() {
            let _ = writeln!(s, "\nCategory Breakdown:");
            for c in &self.categories {
                let _ = writeln!(s, "  - {}: {} ({} withdrawn)", c.category, c.count, format_inr(c.withdrawals));
            }
        }

        if !self.subcategories.is_empty() {
            let _ = writeln!(s, "\nSubcategories Found: {}", self.subcategories.len());
            let _ = writeln!(s, "\nSubcategory Breakdown:");
            for (name, count) in &self.subcategories {
                let _ = writeln!(s, "  - {name}: {count}");
            }
        }

        if !self.groups.is_empty() {
            let _ = writeln!(s, "\nSpending by Category / Subcategory:");
            for g in &self.groups {
                let name = match &g.subcategory {
                    Some(sub) => format!("{} / {sub}", g.category),
                    None => g.category.clone(),
                };
                let _ = writeln!(s, "  - {name}: {} ({})", g.count, format_inr(g.withdrawals));
            }
        }

        if self.low_confidence > 0 {
            let _ = writeln!(s, "\nLow-confidence rows: {}", self.low_confidence);
        }
        let _ = writeln!(s, "{rule}");
        s
    }
}
