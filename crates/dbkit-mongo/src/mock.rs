//! In-memory `BulkSink` for testing the batched-insert fallback
//!
//! Scripts rejection/failure outcomes per call so the fallback loop can be
//! exercised without a live server.

#![allow(clippy::unwrap_used)] // Mocks can panic on lock poisoning

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};

use crate::batch::{BulkRejection, BulkSink, SinkError};
use crate::MongoError;

enum Planned {
    Reject { at: usize, code: i32 },
    Fail(String),
}

#[derive(Default)]
struct MockState {
    planned: VecDeque<Planned>,
    drop_on_next_success: usize,
    inserted: Vec<Document>,
    batch_sizes: Vec<usize>,
}

/// Scriptable in-memory bulk sink
#[derive(Default)]
pub struct MockSink {
    state: Mutex<MockState>,
}

impl MockSink {
    /// Sink that accepts every batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a bulk rejection for the next submission: documents before
    /// `at` are accepted, the rest rejected with `code`.
    pub fn reject_next(&self, at: usize, code: i32) {
        self.state
            .lock()
            .unwrap()
            .planned
            .push_back(Planned::Reject { at, code });
    }

    /// Queue a fatal failure for the next submission
    pub fn fail_next(&self, message: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .planned
            .push_back(Planned::Fail(message.into()));
    }

    /// Make the next successful submission silently lose `count` documents
    /// (for count-verification tests).
    pub fn drop_documents_in_next_success(&self, count: usize) {
        self.state.lock().unwrap().drop_on_next_success = count;
    }

    /// Number of documents the sink has accepted
    pub fn inserted_count(&self) -> usize {
        self.state.lock().unwrap().inserted.len()
    }

    /// Sizes of every submitted batch, in submission order
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.state.lock().unwrap().batch_sizes.clone()
    }

    /// Accepted documents (for test assertions)
    pub fn inserted_documents(&self) -> Vec<Document> {
        self.state.lock().unwrap().inserted.clone()
    }

    /// `seq` field of every accepted document, in acceptance order
    pub fn inserted_sequence(&self) -> Vec<i64> {
        self.state
            .lock()
            .unwrap()
            .inserted
            .iter()
            .filter_map(|doc| doc.get_i64("seq").ok())
            .collect()
    }
}

#[async_trait]
impl BulkSink for MockSink {
    async fn insert_batch(&self, docs: &[Document]) -> Result<Vec<Bson>, SinkError> {
        let mut state = self.state.lock().unwrap();
        state.batch_sizes.push(docs.len());

        match state.planned.pop_front() {
            Some(Planned::Reject { at, code }) => {
                let accepted = at.min(docs.len());
                state.inserted.extend_from_slice(&docs[..accepted]);
                Err(SinkError::Rejected(BulkRejection {
                    first_failed_index: accepted,
                    code,
                    message: "request rate is large".to_string(),
                }))
            }
            Some(Planned::Fail(message)) => Err(SinkError::Fatal(MongoError::Other(message))),
            None => {
                let dropped = std::mem::take(&mut state.drop_on_next_success);
                let accepted = docs.len().saturating_sub(dropped);
                state.inserted.extend_from_slice(&docs[..accepted]);
                Ok((0..accepted)
                    .map(|_| Bson::ObjectId(ObjectId::new()))
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn accepts_by_default_and_scripts_rejections() {
        let sink = MockSink::new();
        let docs = vec![doc! { "seq": 0_i64 }, doc! { "seq": 1_i64 }];

        let ids = sink.insert_batch(&docs).await.unwrap();
        assert_eq!(ids.len(), 2);

        sink.reject_next(1, 16500);
        let err = sink.insert_batch(&docs).await.unwrap_err();
        assert!(matches!(
            err,
            SinkError::Rejected(BulkRejection {
                first_failed_index: 1,
                code: 16500,
                ..
            })
        ));
        // the accepted prefix was kept
        assert_eq!(sink.inserted_count(), 3);
    }

    #[tokio::test]
    async fn scripted_fatal_failure() {
        let sink = MockSink::new();
        sink.fail_next("socket closed");
        let err = sink.insert_batch(&[doc! {}]).await.unwrap_err();
        assert!(matches!(err, SinkError::Fatal(MongoError::Other(_))));
    }
}
