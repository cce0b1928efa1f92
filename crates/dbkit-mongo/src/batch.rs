//! Batched insert with capacity fallback
//!
//! A bulk insert against a throughput-limited backend can be rejected part
//! way through with a capacity error naming the first failing index. The
//! fallback here re-submits the unattempted tail in smaller chunks with a
//! pause between chunks, then verifies the total inserted count against the
//! submitted count. Exactly one escalation tier: a second capacity
//! rejection during the chunked retry is fatal.

use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};

use crate::{MongoError, MongoResult};

/// Throughput-rejection error code of the Mongo-API-fronted document store
/// the defaults were tuned against ("request rate is large").
pub const CAPACITY_ERROR_CODE: i32 = 16500;

/// Tuning for the capacity fallback
///
/// The chunk size and pauses are empirical constants for one vendor's
/// throttling behavior, so they are parameters rather than hard-coded.
#[derive(Debug, Clone)]
pub struct CapacityRetry {
    /// Bulk-write error code treated as a capacity rejection
    pub capacity_error_code: i32,
    /// Pause before the chunked re-submission starts
    pub pause: Duration,
    /// Pause between chunks
    pub chunk_pause: Duration,
    /// Chunk size is `first_failed_index / chunk_divisor`, minimum 1
    pub chunk_divisor: usize,
}

impl Default for CapacityRetry {
    fn default() -> Self {
        Self {
            capacity_error_code: CAPACITY_ERROR_CODE,
            pause: Duration::from_secs(1),
            chunk_pause: Duration::from_secs(1),
            chunk_divisor: 4,
        }
    }
}

/// Bulk-partial-failure response: the backend accepted documents before
/// `first_failed_index` and rejected the rest with `code`.
#[derive(Debug, Clone)]
pub struct BulkRejection {
    pub first_failed_index: usize,
    pub code: i32,
    pub message: String,
}

/// Outcome of a single batch submission
#[derive(Debug)]
pub enum SinkError {
    /// Ordered bulk write stopped at a failing index
    Rejected(BulkRejection),
    /// Any other failure; never retried
    Fatal(MongoError),
}

/// A destination that accepts ordered batches of documents
///
/// The real implementation wraps a driver collection; tests use
/// [`crate::mock::MockSink`].
#[async_trait]
pub trait BulkSink: Send + Sync {
    /// Insert one ordered batch, returning the inserted identifiers
    async fn insert_batch(&self, docs: &[Document]) -> Result<Vec<Bson>, SinkError>;
}

/// Result of a batched insert
#[derive(Debug)]
pub struct BulkInsertReport {
    /// Total number of documents the backend acknowledged
    pub inserted: usize,
    /// Identifiers returned by the backend. On the fallback path the ids
    /// of the segment accepted before the rejection are not reported by
    /// the driver, so this can be shorter than `inserted`.
    pub inserted_ids: Vec<Bson>,
    pub acknowledged: bool,
}

/// Insert `docs` through `sink`, falling back to chunked re-submission on
/// a capacity rejection.
///
/// # Errors
/// Propagates fatal sink errors unchanged, surfaces non-capacity
/// rejections as `MongoError::BulkWrite`, and fails with `CountMismatch`
/// when the acknowledged total does not equal `docs.len()`.
pub async fn insert_with_fallback<S: BulkSink + ?Sized>(
    sink: &S,
    docs: &[Document],
    policy: &CapacityRetry,
) -> MongoResult<BulkInsertReport> {
    if docs.is_empty() {
        return Ok(BulkInsertReport {
            inserted: 0,
            inserted_ids: Vec::new(),
            acknowledged: true,
        });
    }

    match sink.insert_batch(docs).await {
        Ok(inserted_ids) => verify(docs.len(), inserted_ids.len(), inserted_ids),
        Err(SinkError::Fatal(err)) => Err(err),
        Err(SinkError::Rejected(rejection)) => {
            if rejection.code == policy.capacity_error_code {
                resubmit_in_chunks(sink, docs, &rejection, policy).await
            } else {
                Err(MongoError::BulkWrite {
                    index: rejection.first_failed_index,
                    code: rejection.code,
                    message: rejection.message,
                })
            }
        }
    }
}

async fn resubmit_in_chunks<S: BulkSink + ?Sized>(
    sink: &S,
    docs: &[Document],
    rejection: &BulkRejection,
    policy: &CapacityRetry,
) -> MongoResult<BulkInsertReport> {
    let failed_at = rejection.first_failed_index;
    let total = docs.len();
    tracing::warn!(
        "capacity exceeded at index {failed_at} of {total}, re-submitting remainder in chunks"
    );
    tokio::time::sleep(policy.pause).await;

    let chunk_size = (failed_at / policy.chunk_divisor.max(1)).max(1);
    let remaining = &docs[failed_at..];
    let chunk_count = remaining.len().div_ceil(chunk_size);
    let mut inserted_ids = Vec::with_capacity(remaining.len());

    for (chunk_index, chunk) in remaining.chunks(chunk_size).enumerate() {
        let ids = sink.insert_batch(chunk).await.map_err(|err| match err {
            SinkError::Fatal(fatal) => fatal,
            // second capacity rejection: fatal, no further escalation
            SinkError::Rejected(second) => MongoError::BulkWrite {
                index: failed_at + chunk_index * chunk_size + second.first_failed_index,
                code: second.code,
                message: second.message,
            },
        })?;
        inserted_ids.extend(ids);

        let chunks_left = chunk_count.saturating_sub(chunk_index + 1);
        let eta = policy
            .chunk_pause
            .saturating_mul(u32::try_from(chunks_left).unwrap_or(u32::MAX));
        tracing::info!(
            "chunk {}/{chunk_count} inserted, estimated completion in {eta:?}",
            chunk_index + 1
        );
        if chunks_left > 0 {
            tokio::time::sleep(policy.chunk_pause).await;
        }
    }

    verify(total, failed_at + inserted_ids.len(), inserted_ids)
}

fn verify(
    expected: usize,
    inserted: usize,
    inserted_ids: Vec<Bson>,
) -> MongoResult<BulkInsertReport> {
    if inserted == expected {
        Ok(BulkInsertReport {
            inserted,
            inserted_ids,
            acknowledged: true,
        })
    } else {
        Err(MongoError::CountMismatch { expected, inserted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSink;
    use mongodb::bson::doc;

    fn documents(n: usize) -> Vec<Document> {
        (0..n).map(|i| doc! { "seq": i as i64 }).collect()
    }

    fn fast() -> CapacityRetry {
        CapacityRetry {
            pause: Duration::ZERO,
            chunk_pause: Duration::ZERO,
            ..CapacityRetry::default()
        }
    }

    #[tokio::test]
    async fn whole_batch_success_reports_all_ids() {
        let sink = MockSink::new();
        let docs = documents(10);

        let report = insert_with_fallback(&sink, &docs, &fast()).await.unwrap();

        assert!(report.acknowledged);
        assert_eq!(report.inserted, 10);
        assert_eq!(report.inserted_ids.len(), 10);
        assert_eq!(sink.batch_sizes(), vec![10]);
    }

    #[tokio::test]
    async fn capacity_rejection_resubmits_tail_in_quarter_chunks() {
        let sink = MockSink::new();
        sink.reject_next(40, CAPACITY_ERROR_CODE);
        let docs = documents(100);

        let report = insert_with_fallback(&sink, &docs, &fast()).await.unwrap();

        assert!(report.acknowledged);
        assert_eq!(report.inserted, 100);
        // chunked ids only cover the re-submitted tail
        assert_eq!(report.inserted_ids.len(), 60);
        // first attempt, then the 60-document tail in chunks of 40/4 = 10
        assert_eq!(sink.batch_sizes(), vec![100, 10, 10, 10, 10, 10, 10]);
        assert_eq!(sink.inserted_count(), 100);
        // every submitted document arrived exactly once, in order
        assert_eq!(sink.inserted_sequence(), (0..100).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn failing_index_zero_uses_minimum_chunk_size() {
        let sink = MockSink::new();
        sink.reject_next(0, CAPACITY_ERROR_CODE);
        let docs = documents(3);

        let report = insert_with_fallback(&sink, &docs, &fast()).await.unwrap();

        assert_eq!(report.inserted, 3);
        assert_eq!(sink.batch_sizes(), vec![3, 1, 1, 1]);
    }

    #[tokio::test]
    async fn non_capacity_rejection_propagates_without_retry() {
        let sink = MockSink::new();
        sink.reject_next(5, 11000);
        let docs = documents(10);

        let err = insert_with_fallback(&sink, &docs, &fast()).await.unwrap_err();

        match err {
            MongoError::BulkWrite { index, code, .. } => {
                assert_eq!(index, 5);
                assert_eq!(code, 11000);
            }
            other => panic!("unexpected error: {other}"),
        }
        // no chunked attempts were made
        assert_eq!(sink.batch_sizes(), vec![10]);
    }

    #[tokio::test]
    async fn second_capacity_rejection_is_fatal() {
        let sink = MockSink::new();
        sink.reject_next(8, CAPACITY_ERROR_CODE);
        sink.reject_next(1, CAPACITY_ERROR_CODE);
        let docs = documents(12);

        let err = insert_with_fallback(&sink, &docs, &fast()).await.unwrap_err();
        assert!(matches!(err, MongoError::BulkWrite { code, .. } if code == CAPACITY_ERROR_CODE));
        // whole batch, then exactly one chunk attempt
        assert_eq!(sink.batch_sizes(), vec![12, 2]);
    }

    #[tokio::test]
    async fn short_count_fails_with_mismatch() {
        let sink = MockSink::new();
        sink.reject_next(4, CAPACITY_ERROR_CODE);
        sink.drop_documents_in_next_success(1);
        let docs = documents(8);

        let err = insert_with_fallback(&sink, &docs, &fast()).await.unwrap_err();
        assert!(matches!(
            err,
            MongoError::CountMismatch {
                expected: 8,
                inserted: 7
            }
        ));
    }

    #[tokio::test]
    async fn empty_batch_is_acknowledged_without_submission() {
        let sink = MockSink::new();
        let report = insert_with_fallback(&sink, &[], &fast()).await.unwrap();
        assert!(report.acknowledged);
        assert_eq!(report.inserted, 0);
        assert!(sink.batch_sizes().is_empty());
    }
}
