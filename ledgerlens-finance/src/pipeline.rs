//! Two-stage annotation pipeline: normalize every remark, merge, then
//! categorize every row. Categorization never starts before the whole
//! normalization batch has been merged back.

use ledgerlens_core::{
    process_batch, AnnotatedStatement, AnnotatedTransaction, BatchError, BatchResult,
    CategoryAnnotation, Concurrency, Model, Progress, RemarkAnnotation, Stage, Statement,
    Transaction, DEFAULT_REPORT_EVERY,
};
use std::sync::Arc;

use crate::categorize::{CategorizeInput, Categorizer};
use crate::remarks::RemarkNormalizer;

/// Receives `(stage name, completed, total)`
pub type ProgressFn = Arc<dyn Fn(&str, usize, usize) + Send + Sync>;

pub struct Analyzer<M> {
    model: M,
    concurrency: Concurrency,
    report_every: usize,
    on_progress: Option<ProgressFn>,
}

impl<M: Model + Clone> Analyzer<M> {
    pub fn new(model: M, concurrency: Concurrency) -> Self {
        Self {
            model,
            concurrency,
            report_every: DEFAULT_REPORT_EVERY,
            on_progress: None,
        }
    }

    pub fn report_every(mut self, every: usize) -> Self {
        self.report_every = every;
        self
    }

    pub fn on_progress(mut self, f: impl Fn(&str, usize, usize) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(f));
        self
    }

    fn progress_for(&self, stage: &str, total: usize) -> Progress {
        let stage = stage.to_string();
        let observer = self.on_progress.clone();
        Progress::new(total)
            .every(self.report_every)
            .with_observer(move |n, total| match &observer {
                Some(f) => f(&stage, n, total),
                None => tracing::info!(stage = %stage, "processed {n}/{total}"),
            })
    }

    async fn run<S>(&self, stage: &S, inputs: &[S::Input]) -> Result<BatchResult<S::Output>, BatchError>
    where
        S: Stage,
    {
        let progress = self.progress_for(stage.name(), inputs.len());
        let result = process_batch(stage, inputs, self.concurrency, &progress).await?;
        tracing::info!(
            stage = stage.name(),
            rows = result.len(),
            failed = result.failed(),
            skipped = result.skipped(),
            "stage complete"
        );
        Ok(result)
    }

    /// Stage one: remark normalization, merged back onto the rows
    pub async fn normalize(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<Vec<(Transaction, RemarkAnnotation)>, BatchError> {
        let stage = RemarkNormalizer::new(self.model.clone());
        let remarks: Vec<String> = transactions.iter().map(|t| t.remarks.clone()).collect();
        self.run(&stage, &remarks).await?.merge(transactions)
    }

    /// Stage two: categorization of already-normalized rows
    pub async fn categorize(
        &self,
        rows: Vec<(Transaction, RemarkAnnotation)>,
    ) -> Result<Vec<AnnotatedTransaction>, BatchError> {
        let stage = Categorizer::new(self.model.clone());
        let inputs: Vec<CategorizeInput> = rows
            .iter()
            .map(|(txn, remark)| CategorizeInput::from_row(txn, remark))
            .collect();
        let merged: Vec<((Transaction, RemarkAnnotation), CategoryAnnotation)> =
            self.run(&stage, &inputs).await?.merge(rows)?;

        Ok(merged
            .into_iter()
            .map(|((transaction, remark), category)| AnnotatedTransaction {
                transaction,
                remark,
                category,
            })
            .collect())
    }

    pub async fn analyze(&self, statement: Statement) -> Result<AnnotatedStatement, BatchError> {
        let Statement {
            headers,
            transactions,
        } = statement;

        let normalized = self.normalize(transactions).await?;
        let rows = self.categorize(normalized).await?;

        Ok(AnnotatedStatement { headers, rows })
    }
}
