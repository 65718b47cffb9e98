//! Per-topic segment manager.
//!
//! `TopicLog` owns a topic's ordered list of segments and its active
//! (tail) segment, and is the only place a topic's cursors live.
//!
//! ## What Does TopicLog Do?
//!
//! 1. **Assigns IDs**: dense, monotonically increasing 64-bit offsets
//!    starting at 0, one per message
//! 2. **Rolls segments** when the active one reaches the configured
//!    entry count; the new segment's base is the next ID
//! 3. **Appends** batches with positional writes mirrored to every
//!    root
//! 4. **Resolves consumes** to a byte extent plus the data descriptor
//!    so callers stream payloads straight out of the segment
//! 5. **Truncates** whole segments by minimum retained ID and,
//!    optionally, wall-clock time
//!
//! ## The Append Path
//!
//! Appends run in two phases so a slow producer cannot serialize the
//! topic:
//!
//! ```text
//! Producer A ──┐ reserve [ids 0..3, bytes 0..90)    ── under mutex
//! Producer B ──┘ reserve [ids 3..5, bytes 90..130)  ── under mutex
//!         │
//!         ▼ stream (mutex released)
//! A: pwrite data @0, pwrite meta @0     ── disjoint extents,
//! B: pwrite data @90, pwrite meta @48   ── no shared cursor
//! ```
//!
//! 1. **Reserve** — under the topic mutex: roll if the batch would
//!    cross the entry threshold, claim the next ID range and byte
//!    extent, advance the cursors.
//! 2. **Stream** — outside the mutex: copy the payload into the data
//!    file, then the meta records into the meta file, at the reserved
//!    offsets. IDs reflect admission order, not completion order.
//!
//! ## Visibility
//!
//! Visibility follows the meta file, not the reservation cursor: a
//! message is consumable once its meta record is on disk, and
//! consumers derive the committed count from the meta file length —
//! the same quantity recovery trusts after a crash. A reservation
//! still streaming is simply not visible yet.
//!
//! ## Failure Handling
//!
//! A failed append (client disconnect, short write) rolls its
//! reservation back when it is still the tail, so the next append
//! reuses the IDs and overwrites any partial data. If a later batch
//! was admitted meanwhile the failed range is abandoned and never
//! reassigned.
//!
//! ## Usage
//!
//! ```ignore
//! let log = TopicLog::open("orders", &roots, 5000, fd_cache).await?;
//!
//! let first_id = log.append(&[3, 5], now, &mut body).await?;
//!
//! let batch = log.consume(first_id, 100).await?;
//! for (id, size) in (batch.start_id..).zip(&batch.sizes) {
//!     println!("message {id}: {size} bytes");
//! }
//! let payload = batch.read_payload().await?;
//! ```
//!
//! ## Thread Safety
//!
//! `TopicLog` is `Send + Sync` and shared via `Arc`; one mutex guards
//! the mutable state, held only for cursor bookkeeping, never across
//! file I/O on the data path.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures_util::stream::{self, Stream};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Mutex;

use hearthq_core::{meta, Error, MetaRecord, Result, TopicInfo, RECORD_SIZE};

use crate::fd_cache::FdCache;
use crate::multi::{self, MultiFile};
use crate::{pool, segment};

pub struct TopicLog {
    topic: String,
    /// Topic directory under each root; index 0 is the primary.
    dirs: Vec<PathBuf>,
    entries_per_file: u64,
    fd_cache: Arc<FdCache>,
    state: Mutex<LogState>,
}

struct LogState {
    /// Base offsets of all live segments, ascending. Never empty.
    bases: Vec<u64>,
    active: ActiveSegment,
}

struct ActiveSegment {
    base: u64,
    /// Next ID to hand out (reservation cursor).
    next_id: u64,
    /// Next data byte to hand out (reservation cursor).
    data_size: u64,
    data: MultiFile,
    meta: MultiFile,
}

/// One reserved append: the ID range and byte extent claimed under the
/// lock, used to address the writes and to roll back on failure.
#[derive(Debug, Clone, Copy)]
struct Reservation {
    base: u64,
    start_id: u64,
    start_byte: u64,
    count: u64,
    total_bytes: u64,
}

impl TopicLog {
    /// Open a topic's log, recovering the tail segment.
    ///
    /// The topic directory must already exist under the primary root;
    /// missing mirror directories are created. The primary root is
    /// authoritative for the recovered cursor; mirror recovery is best
    /// effort (operators reconcile diverged mirrors).
    pub async fn open(
        topic: &str,
        roots: &[PathBuf],
        entries_per_file: u64,
        fd_cache: Arc<FdCache>,
    ) -> Result<Self> {
        let dirs: Vec<PathBuf> = roots.iter().map(|root| root.join(topic)).collect();
        if !tokio::fs::try_exists(&dirs[0]).await? {
            return Err(Error::TopicDoesNotExist);
        }
        for dir in &dirs[1..] {
            tokio::fs::create_dir_all(dir).await?;
        }

        let mut bases = segment::scan_bases(&dirs[0]).await?;
        let active = match bases.last().copied() {
            Some(base) => {
                let recovered = segment::recover_pair(
                    &segment::data_path(&dirs[0], base),
                    &segment::meta_path(&dirs[0], base),
                )
                .await?;
                for dir in &dirs[1..] {
                    let meta_file = segment::meta_path(dir, base);
                    if tokio::fs::try_exists(&meta_file).await? {
                        if let Err(e) =
                            segment::recover_pair(&segment::data_path(dir, base), &meta_file).await
                        {
                            tracing::warn!(
                                topic = %topic,
                                mirror = %dir.display(),
                                error = %e,
                                "mirror recovery failed"
                            );
                        }
                    }
                }
                let (data, meta_files) = open_pair(&dirs, base).await?;
                ActiveSegment {
                    base,
                    next_id: base + recovered.count,
                    data_size: recovered.data_size,
                    data,
                    meta: meta_files,
                }
            }
            None => {
                bases.push(0);
                let (data, meta_files) = open_pair(&dirs, 0).await?;
                ActiveSegment {
                    base: 0,
                    next_id: 0,
                    data_size: 0,
                    data,
                    meta: meta_files,
                }
            }
        };

        tracing::info!(
            topic = %topic,
            segments = bases.len(),
            next_id = active.next_id,
            "opened topic log"
        );

        Ok(Self {
            topic: topic.to_string(),
            dirs,
            entries_per_file,
            fd_cache,
            state: Mutex::new(LogState { bases, active }),
        })
    }

    /// Append a batch of messages, returning the ID of the first one.
    ///
    /// `sizes` gives the byte length of each message; `body` must
    /// yield exactly their sum. All messages in the batch share the
    /// caller-supplied timestamp.
    pub async fn append<R>(&self, sizes: &[u64], timestamp: u64, body: &mut R) -> Result<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        if sizes.is_empty() {
            return Err(Error::InvalidHeaderSizes);
        }
        let count = sizes.len() as u64;
        let total_bytes: u64 = sizes.iter().sum();

        let (reservation, data, meta_files) = {
            let mut state = self.state.lock().await;
            let used = state.active.next_id - state.active.base;
            if used > 0 && used + count > self.entries_per_file {
                self.roll(&mut state).await?;
            }
            let active = &mut state.active;
            let reservation = Reservation {
                base: active.base,
                start_id: active.next_id,
                start_byte: active.data_size,
                count,
                total_bytes,
            };
            active.next_id += count;
            active.data_size += total_bytes;
            (reservation, active.data.clone(), active.meta.clone())
        };

        match stream_batch(&reservation, sizes, timestamp, &data, &meta_files, body).await {
            Ok(()) => {
                tracing::debug!(
                    topic = %self.topic,
                    start_id = reservation.start_id,
                    count,
                    bytes = total_bytes,
                    "appended batch"
                );
                Ok(reservation.start_id)
            }
            Err(e) => {
                self.rollback(&reservation).await;
                Err(e)
            }
        }
    }

    /// Undo a reservation after a failed append. Only possible while
    /// the reservation is still the tail; otherwise the range is
    /// abandoned (lost IDs, never reassigned).
    async fn rollback(&self, reservation: &Reservation) {
        let mut state = self.state.lock().await;
        let active = &mut state.active;
        if active.base == reservation.base
            && active.next_id == reservation.start_id + reservation.count
        {
            active.next_id = reservation.start_id;
            active.data_size = reservation.start_byte;
            tracing::warn!(
                topic = %self.topic,
                start_id = reservation.start_id,
                "rolled back failed append"
            );
        } else {
            tracing::warn!(
                topic = %self.topic,
                start_id = reservation.start_id,
                count = reservation.count,
                "abandoning failed append range"
            );
        }
    }

    /// Seal the active segment and start the next one at the current
    /// reservation cursor. Caller holds the state lock.
    async fn roll(&self, state: &mut LogState) -> Result<()> {
        let new_base = state.active.next_id;
        let (data, meta_files) = open_pair(&self.dirs, new_base).await?;
        if let Err(e) = state.active.data.sync_all().await {
            tracing::warn!(topic = %self.topic, error = %e, "sync of sealed data file failed");
        }
        if let Err(e) = state.active.meta.sync_all().await {
            tracing::warn!(topic = %self.topic, error = %e, "sync of sealed meta file failed");
        }
        state.bases.push(new_base);
        state.active = ActiveSegment {
            base: new_base,
            next_id: new_base,
            data_size: 0,
            data,
            meta: meta_files,
        };
        tracing::info!(topic = %self.topic, base = new_base, "rolled segment");
        Ok(())
    }

    /// Read up to `limit` messages starting at `start_id` from the
    /// segment that covers it. `limit <= 0` means unlimited.
    ///
    /// Returns an empty batch when `start_id` is at or past the tail;
    /// errors with [`Error::InvalidMessageId`] when it is below the
    /// earliest retained ID.
    pub async fn consume(&self, start_id: u64, limit: i64) -> Result<ConsumeBatch> {
        let (bases, active_base, next_id, active_data, active_meta) = {
            let state = self.state.lock().await;
            (
                state.bases.clone(),
                state.active.base,
                state.active.next_id,
                state.active.data.primary(),
                state.active.meta.primary(),
            )
        };

        if start_id >= next_id {
            return Ok(ConsumeBatch::empty(start_id));
        }
        if start_id < bases[0] {
            return Err(Error::InvalidMessageId);
        }

        let idx = bases.partition_point(|base| *base <= start_id) - 1;
        let base = bases[idx];
        let (data_fd, meta_fd) = if base == active_base {
            (active_data, active_meta)
        } else {
            let dir = &self.dirs[0];
            (
                self.fd_cache.get(&segment::data_path(dir, base)).await?,
                self.fd_cache.get(&segment::meta_path(dir, base)).await?,
            )
        };

        // Committed length comes from the meta file, not the cursor:
        // a reservation still streaming is not visible yet.
        let committed = file_len(meta_fd.clone()).await? / RECORD_SIZE as u64;
        let first_idx = start_id - base;
        if first_idx >= committed {
            return Ok(ConsumeBatch::empty(start_id));
        }

        let mut take = committed - first_idx;
        if limit > 0 {
            take = take.min(limit as u64);
        }

        // Read one extra leading record (when there is one) to learn
        // the batch's start byte from its predecessor's end byte.
        let read_from = first_idx.saturating_sub(1);
        let read_count = take + (first_idx - read_from);
        let buf = multi::read_exact_at(
            meta_fd,
            read_count as usize * RECORD_SIZE,
            meta::record_offset(read_from),
        )
        .await?;
        let records = meta::decode_records(&buf)?;
        pool::put(buf);

        let (start_byte, records) = if first_idx > 0 {
            (records[0].end_byte, &records[1..])
        } else {
            (0, &records[..])
        };

        let mut sizes = Vec::with_capacity(records.len());
        let mut timestamps = Vec::with_capacity(records.len());
        let mut prev = start_byte;
        for record in records {
            if record.end_byte < prev {
                return Err(Error::Integrity(format!(
                    "meta extents out of order in segment {} of {}",
                    segment::stem(base),
                    self.topic
                )));
            }
            sizes.push(record.end_byte - prev);
            timestamps.push(record.timestamp);
            prev = record.end_byte;
        }

        Ok(ConsumeBatch {
            start_id,
            sizes,
            timestamps,
            start_byte,
            data: Some(data_fd),
        })
    }

    /// Remove segments whose entire ID range lies below `before_id`
    /// and, when `before_time` is given, whose last record is strictly
    /// older. When the active segment itself qualifies, a fresh empty
    /// segment is started at the next ID.
    pub async fn truncate_before(
        &self,
        before_id: u64,
        before_time: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let bases = state.bases.clone();
        let mut kept = Vec::with_capacity(bases.len());
        let mut active_removed = false;

        for (i, &base) in bases.iter().enumerate() {
            let end = if base == state.active.base {
                state.active.next_id
            } else {
                bases[i + 1]
            };

            if end > before_id {
                kept.push(base);
                continue;
            }
            if let Some(cutoff) = before_time {
                let count = end - base;
                if count > 0 {
                    let last_ts = self.last_timestamp(&state, base, count).await?;
                    if last_ts as i64 >= cutoff.timestamp() {
                        kept.push(base);
                        continue;
                    }
                }
            }

            for dir in &self.dirs {
                for path in [segment::data_path(dir, base), segment::meta_path(dir, base)] {
                    self.fd_cache.purge(&path).await;
                    if let Err(e) = tokio::fs::remove_file(&path).await {
                        if e.kind() != std::io::ErrorKind::NotFound {
                            return Err(e.into());
                        }
                    }
                }
            }
            if base == state.active.base {
                active_removed = true;
            }
            tracing::info!(topic = %self.topic, base, "removed segment");
        }

        if active_removed {
            let new_base = state.active.next_id;
            let (data, meta_files) = open_pair(&self.dirs, new_base).await?;
            kept.push(new_base);
            state.active = ActiveSegment {
                base: new_base,
                next_id: new_base,
                data_size: 0,
                data,
                meta: meta_files,
            };
            tracing::info!(topic = %self.topic, base = new_base, "started fresh segment after truncation");
        }

        state.bases = kept;
        Ok(())
    }

    async fn last_timestamp(&self, state: &LogState, base: u64, count: u64) -> Result<u64> {
        let fd = if base == state.active.base {
            state.active.meta.primary()
        } else {
            self.fd_cache
                .get(&segment::meta_path(&self.dirs[0], base))
                .await?
        };
        let buf = multi::read_exact_at(fd, RECORD_SIZE, meta::record_offset(count - 1)).await?;
        let record = MetaRecord::decode(&buf[..].try_into().expect("one record"));
        pool::put(buf);
        Ok(record.timestamp)
    }

    /// Offset bounds: earliest surviving base and next ID to assign.
    pub async fn info(&self) -> TopicInfo {
        let state = self.state.lock().await;
        TopicInfo {
            min_offset: state.bases[0],
            max_offset: state.active.next_id,
        }
    }

    /// Flush the active segment. Best effort.
    pub async fn close(&self) {
        let state = self.state.lock().await;
        if let Err(e) = state.active.data.sync_all().await {
            tracing::warn!(topic = %self.topic, error = %e, "close: data sync failed");
        }
        if let Err(e) = state.active.meta.sync_all().await {
            tracing::warn!(topic = %self.topic, error = %e, "close: meta sync failed");
        }
    }
}

/// An ordered run of messages resolved by [`TopicLog::consume`]. The
/// data descriptor rides along so the caller can stream the payload
/// bytes straight out of the segment.
#[derive(Debug)]
pub struct ConsumeBatch {
    pub start_id: u64,
    pub sizes: Vec<u64>,
    pub timestamps: Vec<u64>,
    start_byte: u64,
    data: Option<Arc<File>>,
}

impl ConsumeBatch {
    pub fn empty(start_id: u64) -> Self {
        Self {
            start_id,
            sizes: Vec::new(),
            timestamps: Vec::new(),
            start_byte: 0,
            data: None,
        }
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Read the concatenated payload bytes of the whole batch.
    pub async fn read_payload(&self) -> Result<Bytes> {
        let Some(data) = &self.data else {
            return Ok(Bytes::new());
        };
        let total: u64 = self.sizes.iter().sum();
        let buf = multi::read_exact_at(data.clone(), total as usize, self.start_byte).await?;
        let bytes = Bytes::copy_from_slice(&buf);
        pool::put(buf);
        Ok(bytes)
    }

    /// Stream the batch's payload in bounded chunks straight off the
    /// segment descriptor, without ever materializing the whole batch
    /// in memory.
    pub fn into_stream(self) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static {
        let total: u64 = self.sizes.iter().sum();
        let end = self.start_byte + total;
        stream::try_unfold((self.data, self.start_byte), move |(data, pos)| async move {
            let Some(file) = data else {
                return Ok(None);
            };
            if pos >= end {
                return Ok(None);
            }
            let len = STREAM_CHUNK.min((end - pos) as usize);
            let buf = multi::read_exact_at(file.clone(), len, pos)
                .await
                .map_err(into_io_error)?;
            let chunk = Bytes::copy_from_slice(&buf);
            pool::put(buf);
            Ok(Some((chunk, (Some(file), pos + len as u64))))
        })
    }
}

/// Chunk size for streamed consume payloads.
const STREAM_CHUNK: usize = 64 * 1024;

fn into_io_error(err: Error) -> std::io::Error {
    match err {
        Error::Io(e) => e,
        other => std::io::Error::other(other),
    }
}

async fn open_pair(dirs: &[PathBuf], base: u64) -> Result<(MultiFile, MultiFile)> {
    let data = MultiFile::open(dirs.iter().map(|dir| segment::data_path(dir, base)).collect())
        .await?;
    let meta_files =
        MultiFile::open(dirs.iter().map(|dir| segment::meta_path(dir, base)).collect()).await?;
    Ok((data, meta_files))
}

async fn stream_batch<R>(
    reservation: &Reservation,
    sizes: &[u64],
    timestamp: u64,
    data: &MultiFile,
    meta_files: &MultiFile,
    body: &mut R,
) -> Result<()>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = pool::get(reservation.total_bytes as usize);
    if let Err(e) = body.read_exact(&mut buf).await {
        pool::put(buf);
        return Err(Error::Io(e));
    }
    let buf = data.write_all_at(buf, reservation.start_byte).await?;
    pool::put(buf);

    let mut meta_buf = BytesMut::with_capacity(reservation.count as usize * RECORD_SIZE);
    let mut end = reservation.start_byte;
    for size in sizes {
        end += size;
        MetaRecord {
            end_byte: end,
            timestamp,
        }
        .encode_into(&mut meta_buf);
    }
    let meta_offset = meta::record_offset(reservation.start_id - reservation.base);
    meta_files.write_all_at(meta_buf.to_vec(), meta_offset).await?;
    Ok(())
}

async fn file_len(file: Arc<File>) -> Result<u64> {
    let meta = tokio::task::spawn_blocking(move || file.metadata())
        .await
        .map_err(std::io::Error::other)??;
    Ok(meta.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn new_log(dir: &std::path::Path, entries: u64) -> TopicLog {
        let root = dir.to_path_buf();
        tokio::fs::create_dir_all(root.join("t1")).await.unwrap();
        TopicLog::open("t1", &[root], entries, Arc::new(FdCache::new(16)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn append_assigns_dense_ids() {
        let dir = tempfile::tempdir().unwrap();
        let log = new_log(dir.path(), 5000).await;

        let first = log.append(&[3, 5], 1, &mut &b"abchello"[..]).await.unwrap();
        assert_eq!(first, 0);
        let second = log.append(&[2], 2, &mut &b"!!"[..]).await.unwrap();
        assert_eq!(second, 2);

        let info = log.info().await;
        assert_eq!(info.min_offset, 0);
        assert_eq!(info.max_offset, 3);
    }

    #[tokio::test]
    async fn consume_reconstructs_extents() {
        let dir = tempfile::tempdir().unwrap();
        let log = new_log(dir.path(), 5000).await;
        log.append(&[3, 5], 7, &mut &b"abchello"[..]).await.unwrap();

        let batch = log.consume(0, 10).await.unwrap();
        assert_eq!(batch.start_id, 0);
        assert_eq!(batch.sizes, vec![3, 5]);
        assert_eq!(batch.timestamps, vec![7, 7]);
        assert_eq!(batch.read_payload().await.unwrap(), Bytes::from("abchello"));

        // mid-batch start uses the predecessor's end byte
        let tail = log.consume(1, 10).await.unwrap();
        assert_eq!(tail.sizes, vec![5]);
        assert_eq!(tail.read_payload().await.unwrap(), Bytes::from("hello"));
    }

    #[tokio::test]
    async fn streamed_payload_matches_in_chunks() {
        use futures_util::TryStreamExt;

        let dir = tempfile::tempdir().unwrap();
        let log = new_log(dir.path(), 5000).await;

        // Larger than one stream chunk so the payload spans reads.
        let payload: Vec<u8> = (0..STREAM_CHUNK * 2 + 13).map(|i| i as u8).collect();
        log.append(&[payload.len() as u64], 1, &mut &payload[..])
            .await
            .unwrap();

        let batch = log.consume(0, 1).await.unwrap();
        let chunks: Vec<Bytes> = batch.into_stream().try_collect().await.unwrap();
        assert!(chunks.len() > 1);
        let streamed: Vec<u8> = chunks.concat();
        assert_eq!(streamed, payload);

        let empty = ConsumeBatch::empty(7);
        let chunks: Vec<Bytes> = empty.into_stream().try_collect().await.unwrap();
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn consume_past_tail_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = new_log(dir.path(), 5000).await;
        log.append(&[3, 5], 1, &mut &b"abchello"[..]).await.unwrap();

        let batch = log.consume(5, 10).await.unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.read_payload().await.unwrap(), Bytes::new());
    }

    #[tokio::test]
    async fn failed_append_rolls_back_the_tail() {
        let dir = tempfile::tempdir().unwrap();
        let log = new_log(dir.path(), 5000).await;

        // Body shorter than the declared sizes: the streaming read fails.
        let err = log.append(&[5], 1, &mut &b"ab"[..]).await.unwrap_err();
        assert_eq!(err.token(), "io");
        assert_eq!(log.info().await.max_offset, 0);

        // The next append reuses the IDs and overwrites the partial data.
        let id = log.append(&[5], 2, &mut &b"hello"[..]).await.unwrap();
        assert_eq!(id, 0);
        let batch = log.consume(0, -1).await.unwrap();
        assert_eq!(batch.read_payload().await.unwrap(), Bytes::from("hello"));
    }

    #[tokio::test]
    async fn rolls_at_entry_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let log = new_log(dir.path(), 2).await;
        for b in [b"a", b"b", b"c", b"d", b"e"] {
            log.append(&[1], 1, &mut &b[..]).await.unwrap();
        }

        let topic_dir = dir.path().join("t1");
        for base in [0u64, 2, 4] {
            assert!(segment::data_path(&topic_dir, base).exists(), "missing {base}");
            assert!(segment::meta_path(&topic_dir, base).exists(), "missing {base}");
        }

        let batch = log.consume(2, 2).await.unwrap();
        assert_eq!(batch.read_payload().await.unwrap(), Bytes::from("cd"));
        assert_eq!(batch.sizes, vec![1, 1]);
    }

    #[tokio::test]
    async fn oversized_batch_stays_in_one_segment() {
        let dir = tempfile::tempdir().unwrap();
        let log = new_log(dir.path(), 2).await;

        // A single batch larger than entries_per_file is not split.
        log.append(&[1, 1, 1], 1, &mut &b"abc"[..]).await.unwrap();
        assert_eq!(log.info().await, TopicInfo { min_offset: 0, max_offset: 3 });
        // The next batch rolls.
        log.append(&[1], 1, &mut &b"d"[..]).await.unwrap();
        assert!(segment::data_path(&dir.path().join("t1"), 3).exists());
    }

    #[tokio::test]
    async fn consume_below_min_errors() {
        let dir = tempfile::tempdir().unwrap();
        let log = new_log(dir.path(), 2).await;
        for b in [b"a", b"b", b"c", b"d", b"e"] {
            log.append(&[1], 1, &mut &b[..]).await.unwrap();
        }
        log.truncate_before(4, None).await.unwrap();

        let err = log.consume(1, 1).await.unwrap_err();
        assert_eq!(err.token(), "invalid-message-id");
    }

    #[tokio::test]
    async fn truncate_spares_segments_with_recent_messages() {
        let dir = tempfile::tempdir().unwrap();
        let log = new_log(dir.path(), 1).await;
        log.append(&[1], 100, &mut &b"a"[..]).await.unwrap();
        log.append(&[1], 200, &mut &b"b"[..]).await.unwrap();
        log.append(&[1], 300, &mut &b"c"[..]).await.unwrap();

        // Everything is below ID 3, but only the first segment is
        // older than t=150.
        let cutoff = DateTime::<Utc>::from_timestamp(150, 0).unwrap();
        log.truncate_before(3, Some(cutoff)).await.unwrap();

        let info = log.info().await;
        assert_eq!(info.min_offset, 1);
        assert_eq!(info.max_offset, 3);
    }

    #[tokio::test]
    async fn truncating_everything_starts_fresh_at_next_id() {
        let dir = tempfile::tempdir().unwrap();
        let log = new_log(dir.path(), 2).await;
        for b in [b"a", b"b", b"c"] {
            log.append(&[1], 1, &mut &b[..]).await.unwrap();
        }

        log.truncate_before(10, None).await.unwrap();
        let info = log.info().await;
        assert_eq!(info.min_offset, 3);
        assert_eq!(info.max_offset, 3);

        let id = log.append(&[1], 1, &mut &b"x"[..]).await.unwrap();
        assert_eq!(id, 3);
    }
}
