//! Bounded parallel row processor.
//!
//! Applies one [`Stage`] to every row of a batch:
//! - at most `W` transforms run at once (semaphore admission gate);
//! - blank rows short-circuit to the stage sentinel without taking a permit;
//! - a failing row becomes the sentinel, siblings keep going;
//! - results come back in original row order whatever the completion order.
//!
//! All row futures are polled from the caller's task (no spawning), so the
//! model call is the only suspension point.

use anyhow::Result;
use async_trait::async_trait;
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::num::NonZeroUsize;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::progress::Progress;

/// Default worker cap
pub const DEFAULT_CONCURRENCY: usize = 10;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("concurrency limit must be a positive integer")]
    ZeroConcurrency,

    #[error("{stage}: admission gate closed before row {row} could run")]
    GateClosed { stage: String, row: usize },

    #[error("{stage}: {got} results for {expected} rows")]
    LengthMismatch {
        stage: String,
        expected: usize,
        got: usize,
    },
}

/// A positive worker cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Concurrency(NonZeroUsize);

impl Concurrency {
    pub fn new(limit: usize) -> Result<Self, BatchError> {
        NonZeroUsize::new(limit)
            .map(Concurrency)
            .ok_or(BatchError::ZeroConcurrency)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for Concurrency {
    fn default() -> Self {
        Concurrency(NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN))
    }
}

/// One per-row transformation (normalize a remark, categorize a row, ...)
#[async_trait]
pub trait Stage: Send + Sync {
    type Input: Send + Sync;
    type Output: Send;

    /// Used in logs and errors
    fn name(&self) -> &str;

    /// Rows whose input is blank never reach [`Stage::transform`]
    fn is_blank(&self, input: &Self::Input) -> bool;

    /// Fixed annotation for blank rows and failed transforms
    fn sentinel(&self) -> Self::Output;

    async fn transform(&self, input: &Self::Input) -> Result<Self::Output>;
}

/// What happened to a single row
#[derive(Debug)]
pub enum RowOutcome<A> {
    Ok(A),
    /// Blank input, sentinel assigned without a transform
    Skipped(A),
    Failed(anyhow::Error),
}

impl<A> RowOutcome<A> {
    pub fn is_failed(&self) -> bool {
        matches!(self, RowOutcome::Failed(_))
    }
}

/// Ordered `(row index, annotation)` pairs for one stage
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult<A> {
    stage: String,
    entries: Vec<(usize, A)>,
    failed: usize,
    skipped: usize,
}

impl<A> BatchResult<A> {
    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows whose transform failed and were given the sentinel
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Blank rows that never reached the transform
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn entries(&self) -> &[(usize, A)] {
        &self.entries
    }

    pub fn into_annotations(self) -> Vec<A> {
        self.entries.into_iter().map(|(_, a)| a).collect()
    }

    /// Pair each row with its annotation. Fails if the lengths differ.
    pub fn merge<T>(self, rows: Vec<T>) -> Result<Vec<(T, A)>, BatchError> {
        if rows.len() != self.entries.len() {
            return Err(BatchError::LengthMismatch {
                stage: self.stage,
                expected: rows.len(),
                got: self.entries.len(),
            });
        }
        Ok(rows.into_iter().zip(self.into_annotations()).collect())
    }
}

/// Run `stage` over `inputs` with at most `limit` transforms in flight.
pub async fn process_batch<S>(
    stage: &S,
    inputs: &[S::Input],
    limit: Concurrency,
    progress: &Progress,
) -> Result<BatchResult<S::Output>, BatchError>
where
    S: Stage + ?Sized,
{
    let gate = Semaphore::new(limit.get());
    process_batch_gated(stage, inputs, &gate, progress).await
}

/// Same as [`process_batch`] but admission goes through a caller-owned gate.
///
/// A closed gate is a batch-level failure: the whole batch is abandoned and
/// no partial result is returned.
pub async fn process_batch_gated<S>(
    stage: &S,
    inputs: &[S::Input],
    gate: &Semaphore,
    progress: &Progress,
) -> Result<BatchResult<S::Output>, BatchError>
where
    S: Stage + ?Sized,
{
    tracing::debug!(
        stage = stage.name(),
        rows = inputs.len(),
        permits = gate.available_permits(),
        "starting batch"
    );

    let mut pending: FuturesUnordered<_> = inputs
        .iter()
        .enumerate()
        .map(|(index, input)| run_row(stage, index, input, gate, progress))
        .collect();

    let mut outcomes = Vec::with_capacity(inputs.len());
    while let Some(done) = pending.next().await {
        outcomes.push(done?);
    }
    drop(pending);

    outcomes.sort_by_key(|(index, _)| *index);

    let mut failed = 0;
    let mut skipped = 0;
    let entries = outcomes
        .into_iter()
        .map(|(index, outcome)| {
            let annotation = match outcome {
                RowOutcome::Ok(a) => a,
                RowOutcome::Skipped(a) => {
                    skipped += 1;
                    a
                }
                RowOutcome::Failed(_) => {
                    failed += 1;
                    stage.sentinel()
                }
            };
            (index, annotation)
        })
        .collect();

    if failed > 0 {
        tracing::warn!(stage = stage.name(), failed, "some rows fell back to the default annotation");
    }

    Ok(BatchResult {
        stage: stage.name().to_string(),
        entries,
        failed,
        skipped,
    })
}

async fn run_row<S>(
    stage: &S,
    index: usize,
    input: &S::Input,
    gate: &Semaphore,
    progress: &Progress,
) -> Result<(usize, RowOutcome<S::Output>), BatchError>
where
    S: Stage + ?Sized,
{
    let outcome = if stage.is_blank(input) {
        RowOutcome::Skipped(stage.sentinel())
    } else {
        let permit = gate.acquire().await.map_err(|_| BatchError::GateClosed {
            stage: stage.name().to_string(),
            row: index + 1,
        })?;
        let result = stage.transform(input).await;
        drop(permit);

        match result {
            Ok(annotation) => RowOutcome::Ok(annotation),
            Err(err) => {
                tracing::warn!(stage = stage.name(), row = index + 1, error = %err, "transform failed");
                RowOutcome::Failed(err)
            }
        }
    };

    progress.tick();
    Ok((index, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct Item {
        id: usize,
        text: String,
    }

    fn items(n: usize) -> Vec<Item> {
        (0..n)
            .map(|id| Item {
                id,
                text: format!("row {id}"),
            })
            .collect()
    }

    /// Records concurrency and call counts; later rows finish first.
    #[derive(Default)]
    struct Recorder {
        total: usize,
        fail: HashSet<usize>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl Recorder {
        fn new(total: usize) -> Self {
            Self {
                total,
                ..Default::default()
            }
        }

        fn failing(mut self, ids: &[usize]) -> Self {
            self.fail = ids.iter().copied().collect();
            self
        }
    }

    #[async_trait]
    impl Stage for Recorder {
        type Input = Item;
        type Output = String;

        fn name(&self) -> &str {
            "recorder"
        }

        fn is_blank(&self, input: &Item) -> bool {
            input.text.trim().is_empty()
        }

        fn sentinel(&self) -> String {
            "SENTINEL".to_string()
        }

        async fn transform(&self, input: &Item) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let delay = (self.total - input.id) as u64 * 2;
            tokio::time::sleep(Duration::from_millis(delay)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.fail.contains(&input.id) {
                bail!("model unavailable for row {}", input.id);
            }
            Ok(format!("out-{}", input.id))
        }
    }

    fn limit(n: usize) -> Concurrency {
        Concurrency::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_results_follow_input_order() {
        let recorder = Recorder::new(20);
        let rows = items(20);
        let progress = Progress::new(rows.len());

        let result = process_batch(&recorder, &rows, limit(4), &progress).await.unwrap();

        assert_eq!(result.len(), 20);
        let indices: Vec<usize> = result.entries().iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, (0..20).collect::<Vec<_>>());
        let expected: Vec<String> = (0..20).map(|i| format!("out-{i}")).collect();
        assert_eq!(result.into_annotations(), expected);
    }

    #[tokio::test]
    async fn test_failures_become_sentinel_without_touching_siblings() {
        let recorder = Recorder::new(12).failing(&[2, 7, 11]);
        let rows = items(12);
        let progress = Progress::new(rows.len());

        let result = process_batch(&recorder, &rows, limit(3), &progress).await.unwrap();
        assert_eq!(result.failed(), 3);

        for (i, out) in result.into_annotations().into_iter().enumerate() {
            if [2, 7, 11].contains(&i) {
                assert_eq!(out, "SENTINEL");
            } else {
                assert_eq!(out, format!("out-{i}"));
            }
        }
    }

    #[tokio::test]
    async fn test_in_flight_never_exceeds_limit() {
        for w in [1, 2, 5] {
            let recorder = Recorder::new(15);
            let rows = items(15);
            let progress = Progress::new(rows.len());

            process_batch(&recorder, &rows, limit(w), &progress).await.unwrap();

            let peak = recorder.peak.load(Ordering::SeqCst);
            assert!(peak <= w, "peak {peak} exceeded limit {w}");
            assert_eq!(peak, w);
            assert_eq!(recorder.in_flight.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_progress_counts_every_row_once() {
        let recorder = Recorder::new(37).failing(&[5]);
        let mut rows = items(37);
        rows[9].text = "   ".to_string();

        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = reports.clone();
        let progress = Progress::new(rows.len()).with_observer(move |n, total| {
            sink.lock().unwrap().push((n, total));
        });

        process_batch(&recorder, &rows, limit(4), &progress).await.unwrap();

        assert_eq!(progress.completed(), 37);
        let reports = reports.lock().unwrap();
        assert_eq!(*reports, vec![(10, 37), (20, 37), (30, 37), (37, 37)]);
    }

    #[tokio::test]
    async fn test_blank_rows_skip_transform() {
        let recorder = Recorder::new(6);
        let mut rows = items(6);
        rows[1].text = String::new();
        rows[4].text = " \t ".to_string();
        let progress = Progress::new(rows.len());

        let result = process_batch(&recorder, &rows, limit(2), &progress).await.unwrap();

        assert_eq!(recorder.calls.load(Ordering::SeqCst), 4);
        assert_eq!(result.skipped(), 2);
        assert_eq!(progress.completed(), 6);
        let out = result.into_annotations();
        assert_eq!(out[1], "SENTINEL");
        assert_eq!(out[4], "SENTINEL");
        assert_eq!(out[0], "out-0");
    }

    #[tokio::test]
    async fn test_closed_gate_aborts_batch() {
        let recorder = Recorder::new(3);
        let rows = items(3);
        let progress = Progress::new(rows.len());
        let gate = Semaphore::new(2);
        gate.close();

        let err = process_batch_gated(&recorder, &rows, &gate, &progress).await.unwrap_err();
        assert!(matches!(err, BatchError::GateClosed { .. }));
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let recorder = Recorder::new(0);
        let progress = Progress::new(0);
        let result = process_batch(&recorder, &[], limit(3), &progress).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(progress.completed(), 0);
    }

    #[tokio::test]
    async fn test_merge_checks_length() {
        let recorder = Recorder::new(3);
        let rows = items(3);
        let progress = Progress::new(rows.len());
        let result = process_batch(&recorder, &rows, limit(3), &progress).await.unwrap();

        let err = result.clone().merge(vec!['a', 'b']).unwrap_err();
        assert!(matches!(err, BatchError::LengthMismatch { expected: 2, got: 3, .. }));

        let merged = result.merge(vec!['a', 'b', 'c']).unwrap();
        assert_eq!(merged[2], ('c', "out-2".to_string()));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(matches!(Concurrency::new(0), Err(BatchError::ZeroConcurrency)));
        assert_eq!(Concurrency::new(7).unwrap().get(), 7);
        assert_eq!(Concurrency::default().get(), DEFAULT_CONCURRENCY);
    }
}
