//! Question answering over an annotated statement.
//!
//! The model only ever sees a compact context (totals, date range and
//! per-category spending), never the raw rows.

use anyhow::Result;
use chrono::NaiveDate;
use ledgerlens_core::{AnnotatedStatement, Model};
use std::fmt::Write;

use crate::money::format_inr;
use crate::summary::Summary;

pub const HELP_TEXT: &str = "Ask anything about the analysed statement, for example:\n\
  - What did I spend the most on?\n\
  - How much went to Travel?\n\
  - Where could I save money?\n\
\n\
Commands:\n\
  /help     show this message\n\
  /summary  print the statement summary\n\
  exit, quit, q  leave the chat";

/// One line of user input, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand<'a> {
    Empty,
    Exit,
    Help,
    Summary,
    Ask(&'a str),
}

impl<'a> ChatCommand<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ChatCommand::Empty;
        }
        match line.to_ascii_lowercase().as_str() {
            "exit" | "quit" | "q" => ChatCommand::Exit,
            "/help" => ChatCommand::Help,
            "/summary" => ChatCommand::Summary,
            _ => ChatCommand::Ask(line),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatContext {
    pub total_transactions: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Withdrawal sum per category, largest first
    pub category_spending: Vec<(String, f64)>,
}

impl ChatContext {
    pub fn from_summary(summary: &Summary) -> Self {
        Self {
            total_transactions: summary.total_transactions,
            date_range: summary.date_range,
            category_spending: summary
                .spending_by_category()
                .into_iter()
                .map(|(name, amount)| (name.to_string(), amount))
                .collect(),
        }
    }

    pub fn from_statement(statement: &AnnotatedStatement) -> Self {
        Self::from_summary(&Summary::from_statement(statement))
    }

    pub fn system_prompt(&self) -> String {
        let mut p = String::from(
            "You are a helpful financial assistant analysing bank transaction data.\n\n\
             Transaction Summary:\n",
        );
        let _ = writeln!(p, "- Total Transactions: {}", self.total_transactions);
        if let Some((start, end)) = self.date_range {
            let _ = writeln!(p, "- Date Range: {start} to {end}");
        }
        if !self.category_spending.is_empty() {
            p.push_str("\nCategory-wise Spending:\n");
            for (category, amount) in &self.category_spending {
                let _ = writeln!(p, "- {category}: {}", format_inr(*amount));
            }
        }
        p.push_str(
            "\nAnswer questions about spending patterns, provide insights and suggest ways to save money.\n\
             Be concise and helpful.",
        );
        p
    }
}

/// Forward one question with the statement context as system prompt
pub async fn ask<M: Model + ?Sized>(model: &M, context: &ChatContext, question: &str) -> Result<String> {
    let reply = model.invoke(question, &context.system_prompt()).await?;
    Ok(reply.trim().to_string())
}
