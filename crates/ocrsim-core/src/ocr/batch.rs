//! Concurrent batch orchestration.
//!
//! Every item of a batch is processed in its own task. Tasks report tagged
//! `(index, outcome)` completions over a channel and a single collector
//! places each one into the slot reserved for its index, so the output order
//! always matches the input order regardless of completion order.
//!
//! When the batch cancellation fires, every live task observes the same fired
//! token and resolves at once. The collector drains those last completions
//! for a bounded grace period, keeps the ones that carry finished work, and
//! fills every slot that is still empty with a timeout placeholder. A filled
//! slot is never written twice.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{BatchRequest, BatchResult, OcrService, RecognitionRequest, RecognitionResult};
use crate::{Result, TRACING_TARGET_BATCH};

/// Error reported for items left unfinished by a batch cancellation.
pub(crate) const BATCH_CANCELLED: &str = "batch processing cancelled or timed out";

/// Error reported for items whose task ended without a completion.
pub(crate) const ITEM_TERMINATED: &str = "item processing terminated without a result";

/// How long the collector keeps draining after the batch cancellation fired.
///
/// Bounds the wait on providers that do not observe their token.
pub(crate) const CANCEL_DRAIN_GRACE: Duration = Duration::from_millis(250);

/// A tagged completion sent by an item task.
struct Completion {
    index: usize,
    outcome: Result<RecognitionResult>,
}

/// Reserved output position of one batch item.
#[derive(Debug, Default)]
enum Slot {
    #[default]
    Empty,
    Filled(RecognitionResult),
}

/// Index-aligned result slots with explicit fill state.
#[derive(Debug)]
struct SlotTable {
    slots: Vec<Slot>,
    filled: usize,
}

impl SlotTable {
    fn new(len: usize) -> Self {
        let mut slots = Vec::with_capacity(len);
        slots.resize_with(len, Slot::default);
        Self { slots, filled: 0 }
    }

    /// Writes `result` into an empty slot; returns `false` if it was taken.
    fn fill(&mut self, index: usize, result: RecognitionResult) -> bool {
        match self.slots.get_mut(index) {
            Some(slot @ Slot::Empty) => {
                *slot = Slot::Filled(result);
                self.filled += 1;
                true
            }
            _ => false,
        }
    }

    fn is_complete(&self) -> bool {
        self.filled == self.slots.len()
    }

    fn remaining(&self) -> usize {
        self.slots.len() - self.filled
    }

    /// Fills every empty slot with `fallback` and returns the results.
    fn finish(self, mut fallback: impl FnMut(usize) -> RecognitionResult) -> Vec<RecognitionResult> {
        self.slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| match slot {
                Slot::Filled(result) => result,
                Slot::Empty => fallback(index),
            })
            .collect()
    }
}

/// Why the collector stopped before every slot was filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interruption {
    /// The batch cancellation fired.
    Cancelled,
    /// Every task ended but some never reported.
    Disconnected,
}

impl OcrService {
    /// Recognizes every item of `batch` concurrently.
    ///
    /// The result always has one entry per item, in input order. Items
    /// unfinished when `cancellation` fires report status 408; items whose
    /// provider failed report status 500 without affecting their siblings.
    #[tracing::instrument(skip_all, fields(items = batch.len()))]
    pub async fn recognize_batch(
        &self,
        cancellation: &CancellationToken,
        batch: &BatchRequest,
    ) -> BatchResult {
        let items = batch.items();
        if items.is_empty() {
            return BatchResult::default();
        }

        let (sender, mut receiver) = mpsc::channel::<Completion>(items.len());
        for (index, item) in items.iter().enumerate() {
            let sender = sender.clone();
            let task = self.item_task(cancellation.clone(), item.clone());

            tokio::spawn(async move {
                let outcome = task.await;
                // The collector is gone once it returned; nothing awaits this item.
                let _ = sender.send(Completion { index, outcome }).await;
            });
        }
        drop(sender);

        let mut slots = SlotTable::new(items.len());
        let mut interruption = None;

        while !slots.is_complete() {
            tokio::select! {
                completion = receiver.recv() => {
                    let Some(completion) = completion else {
                        interruption = Some(Interruption::Disconnected);
                        break;
                    };

                    if !accept(&mut slots, items, completion, cancellation) {
                        interruption = Some(Interruption::Cancelled);
                        break;
                    }
                }
                () = cancellation.cancelled() => {
                    interruption = Some(Interruption::Cancelled);
                    break;
                }
            }
        }

        if interruption == Some(Interruption::Cancelled) {
            // Items that finished just before the cancellation still report.
            let drain = async {
                while let Some(completion) = receiver.recv().await {
                    accept(&mut slots, items, completion, cancellation);
                }
            };

            let drained = tokio::time::timeout(CANCEL_DRAIN_GRACE, drain).await;
            if drained.is_err() {
                tracing::warn!(
                    target: TRACING_TARGET_BATCH,
                    remaining = slots.remaining(),
                    grace_ms = CANCEL_DRAIN_GRACE.as_millis() as u64,
                    "items still running after batch cancellation"
                );
            }
        }

        let backfilled = slots.remaining();
        let results = slots.finish(|index| backfill(&items[index], interruption));

        tracing::info!(
            target: TRACING_TARGET_BATCH,
            items = items.len(),
            backfilled,
            cancelled = interruption == Some(Interruption::Cancelled),
            "batch resolved"
        );

        BatchResult::new(results)
    }
}

/// Places a completion into its slot.
///
/// Returns `false` for a completion cancelled by the batch itself; that slot
/// is left to the cancellation backfill.
fn accept(
    slots: &mut SlotTable,
    items: &[RecognitionRequest],
    completion: Completion,
    cancellation: &CancellationToken,
) -> bool {
    let Completion { index, outcome } = completion;

    let result = match outcome {
        Ok(result) => result,
        Err(error) if error.is_cancelled() && cancellation.is_cancelled() => return false,
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET_BATCH,
                index,
                key = items[index].key(),
                error = %error,
                kind = error.kind_str(),
                "batch item failed"
            );

            RecognitionResult::rejected(
                items[index].key(),
                RecognitionResult::STATUS_FAILED,
                error.message(),
            )
        }
    };

    if !slots.fill(index, result) {
        tracing::error!(
            target: TRACING_TARGET_BATCH,
            index,
            "duplicate completion for a filled slot"
        );
    }

    true
}

/// Placeholder for an item whose slot was never filled.
fn backfill(item: &RecognitionRequest, interruption: Option<Interruption>) -> RecognitionResult {
    match interruption {
        Some(Interruption::Cancelled) => RecognitionResult::rejected(
            item.key(),
            RecognitionResult::STATUS_TIMEOUT,
            BATCH_CANCELLED,
        ),
        Some(Interruption::Disconnected) | None => RecognitionResult::rejected(
            item.key(),
            RecognitionResult::STATUS_FAILED,
            ITEM_TERMINATED,
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::Error;
    use crate::ocr::{OcrProvider, ScriptedProvider};

    fn batch(keys: &[&str]) -> BatchRequest {
        keys.iter()
            .map(|key| RecognitionRequest::new(*key, format!("http://x/{key}")))
            .collect()
    }

    fn cancel_after(token: &CancellationToken, after: Duration) {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            token.cancel();
        });
    }

    /// Checks the properties every batch result must satisfy.
    fn assert_well_formed(request: &BatchRequest, result: &BatchResult) {
        assert_eq!(result.len(), request.len());

        for (item, result) in request.items().iter().zip(result.results()) {
            assert_eq!(result.key(), item.key());

            let has_error = result.error().is_some_and(|e| !e.is_empty());
            assert!(!(has_error && !result.text().is_empty()));

            if result.status_code() == 200 {
                assert!(!has_error);
            } else {
                assert!(result.text().is_empty());
                assert!(has_error);
            }
        }
    }

    #[test]
    fn slot_is_written_once() {
        let mut slots = SlotTable::new(2);
        assert!(slots.fill(0, RecognitionResult::completed("a", "first")));
        assert!(!slots.fill(0, RecognitionResult::completed("a", "second")));
        assert!(!slots.fill(5, RecognitionResult::completed("z", "out of range")));
        assert_eq!(slots.remaining(), 1);

        let results = slots.finish(|i| RecognitionResult::rejected(format!("fallback{i}"), 408, "late"));
        assert_eq!(results[0].text(), "first");
        assert_eq!(results[1].key(), "fallback1");
    }

    #[test]
    fn empty_key_is_not_an_empty_slot() {
        let mut slots = SlotTable::new(1);
        assert!(slots.fill(0, RecognitionResult::completed("", "text")));
        assert!(slots.is_complete());

        let results = slots.finish(|_| unreachable!("slot was filled"));
        assert_eq!(results[0].text(), "text");
    }

    #[tokio::test(start_paused = true)]
    async fn all_items_complete_in_input_order() {
        let provider = ScriptedProvider::new(Duration::from_secs(1))
            .with_delay("a", Duration::from_secs(3))
            .with_delay("b", Duration::from_secs(2))
            .with_delay("c", Duration::from_secs(1));
        let service = OcrService::new(provider);
        let request = batch(&["a", "b", "c"]);

        let result = service
            .recognize_batch(&CancellationToken::new(), &request)
            .await;

        assert_well_formed(&request, &result);
        assert_eq!(result.success_count(), 3);
        for (key, result) in ["a", "b", "c"].iter().zip(result.results()) {
            assert_eq!(result.text(), ScriptedProvider::text_for(key));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_backfills_only_unfinished_items() {
        let provider = ScriptedProvider::new(Duration::from_secs(1))
            .with_delay("k1", Duration::from_secs(1))
            .with_delay("k2", Duration::from_secs(2))
            .with_delay("k3", Duration::from_secs(6))
            .with_delay("k4", Duration::from_secs(7))
            .with_delay("k5", Duration::from_secs(8));
        let service = OcrService::new(provider);
        let request = batch(&["k1", "k2", "k3", "k4", "k5"]);
        let token = CancellationToken::new();
        cancel_after(&token, Duration::from_secs(3));

        let result = service.recognize_batch(&token, &request).await;

        assert_well_formed(&request, &result);
        let results = result.results();
        assert!(results[0].is_success());
        assert!(results[1].is_success());
        for result in &results[2..] {
            assert_eq!(result.status_code(), 408);
            assert_eq!(result.error(), Some(BATCH_CANCELLED));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_returns_promptly() {
        let provider = ScriptedProvider::new(Duration::from_secs(60));
        let service = OcrService::new(provider);
        let request = batch(&["a", "b"]);
        let token = CancellationToken::new();
        cancel_after(&token, Duration::from_millis(100));

        let started = tokio::time::Instant::now();
        let result = service.recognize_batch(&token, &request).await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_well_formed(&request, &result);
        assert!(result.results().iter().all(|r| r.status_code() == 408));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_item_does_not_abort_siblings() {
        let provider = ScriptedProvider::new(Duration::from_secs(1)).with_failure("bad");
        let service = OcrService::new(provider);
        let request = batch(&["ok1", "bad", "ok2"]);

        let result = service
            .recognize_batch(&CancellationToken::new(), &request)
            .await;

        assert_well_formed(&request, &result);
        let results = result.results();
        assert!(results[0].is_success());
        assert_eq!(results[1].status_code(), 500);
        assert_eq!(results[1].error(), Some("unreadable document"));
        assert!(results[2].is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn item_deadline_reports_server_error_for_that_item() {
        let provider = ScriptedProvider::new(Duration::from_secs(1))
            .with_delay("slow", Duration::from_secs(5));
        let service =
            OcrService::new(provider).with_item_timeout(Some(Duration::from_secs(2)));
        let request = batch(&["fast", "slow"]);

        let result = service
            .recognize_batch(&CancellationToken::new(), &request)
            .await;

        assert_well_formed(&request, &result);
        let results = result.results();
        assert!(results[0].is_success());
        assert_eq!(results[1].status_code(), 500);
        assert_eq!(results[1].error(), Some("processing cancelled due to timeout"));
    }

    #[tokio::test(start_paused = true)]
    async fn panicked_item_is_reported_not_dropped() {
        let provider = ScriptedProvider::new(Duration::from_secs(1)).with_panic("boom");
        let service = OcrService::new(provider);
        let request = batch(&["ok", "boom"]);

        let result = service
            .recognize_batch(&CancellationToken::new(), &request)
            .await;

        assert_well_formed(&request, &result);
        assert!(result.results()[0].is_success());
        assert_eq!(result.results()[1].status_code(), 500);
        assert_eq!(result.results()[1].error(), Some(ITEM_TERMINATED));
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_and_empty_keys_keep_their_positions() {
        let provider = ScriptedProvider::new(Duration::from_secs(1))
            .with_delay("", Duration::from_secs(2));
        let service = OcrService::new(provider);
        let request = batch(&["dup", "", "dup"]);

        let result = service
            .recognize_batch(&CancellationToken::new(), &request)
            .await;

        assert_well_formed(&request, &result);
        assert_eq!(result.success_count(), 3);
    }

    /// Provider that records every key it finished before returning it.
    #[derive(Debug)]
    struct RecordingProvider {
        delay: Duration,
        finished: Mutex<HashSet<String>>,
    }

    impl RecordingProvider {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                finished: Mutex::new(HashSet::new()),
            }
        }

        fn finished(&self) -> HashSet<String> {
            self.finished.lock().expect("lock is not poisoned").clone()
        }
    }

    #[async_trait::async_trait]
    impl OcrProvider for RecordingProvider {
        async fn process(
            &self,
            cancellation: &CancellationToken,
            request: &RecognitionRequest,
        ) -> Result<RecognitionResult> {
            tokio::select! {
                () = tokio::time::sleep(self.delay) => {}
                () = cancellation.cancelled() => return Err(Error::cancelled()),
            }

            let result = RecognitionResult::completed(request.key(), "recorded text");
            self.finished
                .lock()
                .expect("lock is not poisoned")
                .insert(request.key().to_owned());
            Ok(result)
        }
    }

    /// Provider that never observes its cancellation token.
    #[derive(Debug)]
    struct StubbornProvider;

    #[async_trait::async_trait]
    impl OcrProvider for StubbornProvider {
        async fn process(
            &self,
            _cancellation: &CancellationToken,
            request: &RecognitionRequest,
        ) -> Result<RecognitionResult> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(RecognitionResult::completed(request.key(), "too late"))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn finished_items_survive_a_simultaneous_cancellation() {
        let keys: Vec<String> = (0..16).map(|i| format!("item-{i}")).collect();
        let request: BatchRequest = keys
            .iter()
            .map(|key| RecognitionRequest::new(key.as_str(), "http://x"))
            .collect();

        for _ in 0..100 {
            let provider = Arc::new(RecordingProvider::new(Duration::from_millis(20)));
            let service = OcrService::from_provider(provider.clone());
            let token = CancellationToken::new();
            cancel_after(&token, Duration::from_millis(20));

            let result = service.recognize_batch(&token, &request).await;
            assert_well_formed(&request, &result);

            let finished = provider.finished();
            for item in result.results() {
                if finished.contains(item.key()) {
                    assert!(
                        item.is_success(),
                        "finished item {} was reported as {}",
                        item.key(),
                        item.status_code()
                    );
                }
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_drain_is_bounded() {
        let service = OcrService::new(StubbornProvider);
        let request = batch(&["a", "b", "c"]);
        let token = CancellationToken::new();
        cancel_after(&token, Duration::from_millis(100));

        let started = tokio::time::Instant::now();
        let result = service.recognize_batch(&token, &request).await;

        assert!(started.elapsed() < Duration::from_millis(100) + CANCEL_DRAIN_GRACE * 2);
        assert_well_formed(&request, &result);
        for result in result.results() {
            assert_eq!(result.status_code(), 408);
            assert_eq!(result.error(), Some(BATCH_CANCELLED));
        }
    }

    #[tokio::test]
    async fn empty_batch_yields_empty_result() {
        let service = OcrService::new(ScriptedProvider::default());
        let result = service
            .recognize_batch(&CancellationToken::new(), &BatchRequest::default())
            .await;
        assert!(result.is_empty());
    }
}
