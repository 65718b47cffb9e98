//! Topic registry and queue facade.
//!
//! `FileQueue` maps topic names to their [`TopicLog`]s. The
//! filesystem is the source of truth — a topic exists iff its
//! directory exists under the primary root — and logs are opened
//! lazily on first use. Topic directories are mirrored across every
//! configured root.

use regex::Regex;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::sync::RwLock;

use hearthq_core::{Error, ModifyRequest, Result, TopicInfo};

use crate::config::QueueConfig;
use crate::fd_cache::FdCache;
use crate::log::{ConsumeBatch, TopicLog};

pub struct FileQueue {
    roots: Vec<PathBuf>,
    entries_per_file: u64,
    fd_cache: Arc<FdCache>,
    logs: RwLock<HashMap<String, Arc<TopicLog>>>,
}

impl FileQueue {
    /// Open a queue over the configured roots, creating them if
    /// needed.
    pub async fn open(config: QueueConfig) -> Result<Self> {
        if config.roots.is_empty() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "at least one root directory is required",
            )));
        }
        for root in &config.roots {
            tokio::fs::create_dir_all(root).await?;
        }
        let fd_cache = if config.fd_cache {
            FdCache::new(config.fd_cache_size)
        } else {
            FdCache::disabled()
        };
        tracing::info!(
            roots = config.roots.len(),
            primary = %config.roots[0].display(),
            entries_per_file = config.entries_per_file,
            fd_cache = config.fd_cache,
            "opened file queue"
        );
        Ok(Self {
            roots: config.roots,
            entries_per_file: config.entries_per_file,
            fd_cache: Arc::new(fd_cache),
            logs: RwLock::new(HashMap::new()),
        })
    }

    /// The primary root directory.
    pub fn root_dir(&self) -> &Path {
        &self.roots[0]
    }

    /// Create a topic under every root. Errors when the directory
    /// already exists in any of them.
    pub async fn create_topic(&self, topic: &str) -> Result<()> {
        for root in &self.roots {
            let dir = root.join(topic);
            if tokio::fs::try_exists(&dir).await? {
                return Err(Error::TopicAlreadyExists);
            }
            tokio::fs::create_dir_all(&dir).await?;
        }
        tracing::info!(topic = %topic, "created topic");
        Ok(())
    }

    /// Remove a topic's directory from every root. Deleting a topic
    /// that does not exist is not an error.
    pub async fn delete_topic(&self, topic: &str) -> Result<()> {
        self.logs.write().await.remove(topic);
        for root in &self.roots {
            let dir = root.join(topic);
            self.fd_cache.purge_dir(&dir).await;
            if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                if e.kind() != io::ErrorKind::NotFound {
                    return Err(e.into());
                }
            }
        }
        tracing::info!(topic = %topic, "deleted topic");
        Ok(())
    }

    /// List topics in the primary root, lexicographically, filtered by
    /// prefix, then suffix, then regex. Empty filters match everything.
    pub async fn list_topics(&self, prefix: &str, suffix: &str, regex: &str) -> Result<Vec<String>> {
        let pattern = if regex.is_empty() {
            None
        } else {
            Some(Regex::new(regex).map_err(|e| {
                Error::Io(io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))
            })?)
        };

        let mut topics = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.roots[0]).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !name.starts_with(prefix) || !name.ends_with(suffix) {
                continue;
            }
            if let Some(pattern) = &pattern {
                if !pattern.is_match(&name) {
                    continue;
                }
            }
            topics.push(name);
        }
        topics.sort_unstable();
        Ok(topics)
    }

    /// Truncate a topic per the modify request and report its
    /// resulting offset bounds. A non-positive `truncate` retains
    /// everything.
    pub async fn modify_topic(&self, topic: &str, request: ModifyRequest) -> Result<TopicInfo> {
        let log = self.get_log(topic).await?;
        let before_id = u64::try_from(request.truncate).unwrap_or(0);
        if before_id > 0 {
            log.truncate_before(before_id, request.before).await?;
        }
        Ok(log.info().await)
    }

    /// Append a batch of messages; returns the first assigned ID.
    pub async fn produce<R>(
        &self,
        topic: &str,
        sizes: &[u64],
        timestamp: u64,
        body: &mut R,
    ) -> Result<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        if sizes.is_empty() {
            return Err(Error::InvalidHeaderSizes);
        }
        let log = self.get_log(topic).await?;
        log.append(sizes, timestamp, body).await
    }

    /// Read up to `limit` messages starting at `id`. `limit <= 0`
    /// means unlimited.
    pub async fn consume(&self, topic: &str, id: i64, limit: i64) -> Result<ConsumeBatch> {
        if id < 0 {
            return Err(Error::InvalidMessageId);
        }
        let log = self.get_log(topic).await?;
        log.consume(id as u64, limit).await
    }

    /// Offset bounds of a topic.
    pub async fn info(&self, topic: &str) -> Result<TopicInfo> {
        Ok(self.get_log(topic).await?.info().await)
    }

    /// Flush all open logs and drop every cached descriptor.
    pub async fn close(&self) {
        let mut logs = self.logs.write().await;
        for log in logs.values() {
            log.close().await;
        }
        logs.clear();
        self.fd_cache.clear().await;
    }

    async fn get_log(&self, topic: &str) -> Result<Arc<TopicLog>> {
        {
            let logs = self.logs.read().await;
            if let Some(log) = logs.get(topic) {
                return Ok(log.clone());
            }
        }

        let mut logs = self.logs.write().await;
        if let Some(log) = logs.get(topic) {
            return Ok(log.clone());
        }
        let log = Arc::new(
            TopicLog::open(
                topic,
                &self.roots,
                self.entries_per_file,
                self.fd_cache.clone(),
            )
            .await?,
        );
        logs.insert(topic.to_string(), log.clone());
        Ok(log)
    }
}
