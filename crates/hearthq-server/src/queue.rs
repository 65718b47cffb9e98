//! The queue capability consumed by the HTTP layer.
//!
//! Handlers only ever see `Arc<dyn Queue>`; the file-backed
//! implementation lives in `hearthq-storage`, and tests substitute an
//! in-memory one. The boundary stays streaming in both directions:
//! produce hands the broker the request body as a reader, and consume
//! hands the HTTP layer a body that reads off the segment descriptor
//! in bounded chunks — a multi-gigabyte batch never sits in server
//! memory.

use async_trait::async_trait;
use axum::body::Body;
use std::path::Path;
use tokio::io::AsyncRead;

use hearthq_core::{ModifyRequest, Result, TopicInfo};
use hearthq_storage::FileQueue;

/// One consumed batch as the HTTP layer ships it: per-message sizes
/// for the `X-Sizes` header and a streaming body of the concatenated
/// payloads.
pub struct ConsumedBatch {
    pub sizes: Vec<u64>,
    pub body: Body,
}

impl ConsumedBatch {
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

#[async_trait]
pub trait Queue: Send + Sync {
    async fn create_topic(&self, topic: &str) -> Result<()>;

    async fn delete_topic(&self, topic: &str) -> Result<()>;

    async fn list_topics(&self, prefix: &str, suffix: &str, regex: &str) -> Result<Vec<String>>;

    async fn modify_topic(&self, topic: &str, request: ModifyRequest) -> Result<TopicInfo>;

    /// Append `sizes.len()` messages streamed from `body`, which must
    /// yield exactly the sizes' sum; returns the first assigned ID.
    async fn produce(
        &self,
        topic: &str,
        sizes: &[u64],
        timestamp: u64,
        body: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<u64>;

    /// Read up to `limit` messages starting at `id` (`limit <= 0` is
    /// unlimited).
    async fn consume(&self, topic: &str, id: i64, limit: i64) -> Result<ConsumedBatch>;

    /// Primary root directory, served under `/raw/`.
    fn root_dir(&self) -> &Path;

    async fn close(&self);
}

#[async_trait]
impl Queue for FileQueue {
    async fn create_topic(&self, topic: &str) -> Result<()> {
        FileQueue::create_topic(self, topic).await
    }

    async fn delete_topic(&self, topic: &str) -> Result<()> {
        FileQueue::delete_topic(self, topic).await
    }

    async fn list_topics(&self, prefix: &str, suffix: &str, regex: &str) -> Result<Vec<String>> {
        FileQueue::list_topics(self, prefix, suffix, regex).await
    }

    async fn modify_topic(&self, topic: &str, request: ModifyRequest) -> Result<TopicInfo> {
        FileQueue::modify_topic(self, topic, request).await
    }

    async fn produce(
        &self,
        topic: &str,
        sizes: &[u64],
        timestamp: u64,
        body: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<u64> {
        FileQueue::produce(self, topic, sizes, timestamp, body).await
    }

    async fn consume(&self, topic: &str, id: i64, limit: i64) -> Result<ConsumedBatch> {
        let batch = FileQueue::consume(self, topic, id, limit).await?;
        let sizes = batch.sizes.clone();
        Ok(ConsumedBatch {
            sizes,
            body: Body::from_stream(batch.into_stream()),
        })
    }

    fn root_dir(&self) -> &Path {
        FileQueue::root_dir(self)
    }

    async fn close(&self) {
        FileQueue::close(self).await;
    }
}
