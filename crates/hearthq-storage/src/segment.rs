//! Segment file naming, discovery, and crash recovery.
//!
//! ## What is a Segment?
//!
//! A segment is one contiguous run of a topic's messages stored as a
//! pair of files named for its **base offset** — the ID of the first
//! message it holds — zero-padded to 16 hex digits so lexicographic
//! directory order matches numeric order:
//!
//! ```text
//! <root>/<topic>/
//!   0000000000001388.hrq    payload bytes, back to back
//!   0000000000001388.dat    one 16-byte meta record per message
//! ```
//!
//! ## File Pair Layout
//!
//! The data file is nothing but payload bytes; all structure lives in
//! the meta file. Record `i` describes message `base + i`:
//!
//! ```text
//! .hrq   ┌───────┬─────────────┬───────┐
//!        │ "abc" │   "hello"   │ "!!"  │
//!        └───────┴─────────────┴───────┘
//!        0       3             8      10
//! .dat   ┌ end=3 ┬ end=8 ┬ end=10 ┐      (+ timestamp each)
//!        └───────┴───────┴────────┘
//! ```
//!
//! A record's start byte is its predecessor's end byte (0 for the
//! first), so extents need no explicit start field and the meta file
//! is the authority for how many messages a segment holds:
//! `metaLen / RECORD_SIZE`.
//!
//! ## Recovery
//!
//! An interrupted append can leave either file longer than the other
//! root's committed state. [`recover_pair`] restores consistency in
//! order:
//!
//! 1. Meta length not a record multiple → truncate the torn tail
//! 2. Data longer than the last committed end byte → truncate the
//!    uncommitted bytes (they belong to an append that never finished
//!    its meta write)
//! 3. Data *shorter* than the meta claims → unrecoverable, the open
//!    fails with an integrity error
//!
//! ## Why Truncate Instead of Repair?
//!
//! A message is only visible once its meta record is on disk, so
//! anything past the last full record was never acknowledged to a
//! producer — dropping it loses nothing a client was promised.

use std::path::{Path, PathBuf};

use hearthq_core::{meta, Error, MetaRecord, Result, RECORD_SIZE};

pub const DATA_EXT: &str = "hrq";
pub const META_EXT: &str = "dat";

/// Filename stem for a segment: the base offset as 16 hex digits.
pub fn stem(base: u64) -> String {
    format!("{base:016x}")
}

pub fn data_path(dir: &Path, base: u64) -> PathBuf {
    dir.join(format!("{}.{DATA_EXT}", stem(base)))
}

pub fn meta_path(dir: &Path, base: u64) -> PathBuf {
    dir.join(format!("{}.{META_EXT}", stem(base)))
}

/// List the base offsets present in a topic directory, ascending.
///
/// Only well-formed `<16 hex digits>.dat` names count; stray files are
/// ignored.
pub async fn scan_bases(dir: &Path) -> Result<Vec<u64>> {
    let mut bases = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(stem) = name.strip_suffix(&format!(".{META_EXT}")) else {
            continue;
        };
        if stem.len() != 16 {
            continue;
        }
        if let Ok(base) = u64::from_str_radix(stem, 16) {
            bases.push(base);
        }
    }
    bases.sort_unstable();
    Ok(bases)
}

/// Outcome of recovering one segment pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recovered {
    /// Number of committed messages.
    pub count: u64,
    /// Committed data length (last record's end byte).
    pub data_size: u64,
}

/// Bring one root's copy of a segment pair back to a consistent state.
///
/// Torn meta records (a length that is not a record multiple) are
/// truncated away; data past the last committed end byte is garbage
/// from an interrupted append and is truncated too. Data shorter than
/// the meta claims is an integrity failure.
pub async fn recover_pair(data: &Path, meta_file: &Path) -> Result<Recovered> {
    let meta_len = tokio::fs::metadata(meta_file).await?.len();
    let torn = meta_len % RECORD_SIZE as u64;
    let meta_len = if torn != 0 {
        tracing::warn!(
            path = %meta_file.display(),
            bytes = torn,
            "truncating torn meta record"
        );
        let keep = meta_len - torn;
        truncate_file(meta_file, keep).await?;
        keep
    } else {
        meta_len
    };

    let count = meta_len / RECORD_SIZE as u64;
    let data_size = if count == 0 {
        0
    } else {
        let file = std::fs::File::open(meta_file)?;
        let buf = crate::multi::read_exact_at(
            std::sync::Arc::new(file),
            RECORD_SIZE,
            meta::record_offset(count - 1),
        )
        .await?;
        let last = MetaRecord::decode(&buf[..].try_into().expect("one record"));
        crate::pool::put(buf);
        last.end_byte
    };

    let data_len = tokio::fs::metadata(data).await?.len();
    if data_len > data_size {
        tracing::warn!(
            path = %data.display(),
            bytes = data_len - data_size,
            "truncating uncommitted data bytes"
        );
        truncate_file(data, data_size).await?;
    } else if data_len < data_size {
        return Err(Error::Integrity(format!(
            "data file {} holds {data_len} bytes but meta commits {data_size}",
            data.display()
        )));
    }

    Ok(Recovered { count, data_size })
}

async fn truncate_file(path: &Path, len: u64) -> Result<()> {
    let file = tokio::fs::OpenOptions::new()
        .write(true)
        .open(path)
        .await?;
    file.set_len(len).await?;
    Ok(())
}
