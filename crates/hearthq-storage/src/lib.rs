//! File-backed log engine for hearthq.
//!
//! Every topic is a directory holding a sequence of segment file
//! pairs: a `.hrq` data file of contiguous payload bytes and a `.dat`
//! meta file of fixed-size records mapping message IDs to byte
//! extents. The engine assigns dense, monotonically increasing 64-bit
//! IDs per topic, rolls segments at a configurable entry count, and
//! mirrors every write across all configured root directories.
//!
//! ## Layout
//!
//! ```text
//! <root>/
//!   <topic>/
//!     0000000000000000.hrq    payload bytes
//!     0000000000000000.dat    meta records, 16 bytes each
//!     0000000000001388.hrq    next segment, base = 5000
//!     0000000000001388.dat
//! ```
//!
//! ## Concurrency
//!
//! Mutual exclusion is per topic: appends reserve their ID range and
//! byte extent under the topic mutex, then stream payload bytes with
//! positional writes outside it, so slow producers do not serialize
//! the topic. Consumers snapshot the segment list and read without
//! blocking appends. A message becomes visible only once its meta
//! records are on disk.

pub mod config;
pub mod fd_cache;
pub mod log;
pub mod multi;
pub mod pool;
pub mod queue;
pub mod segment;

pub use config::QueueConfig;
pub use fd_cache::FdCache;
pub use log::{ConsumeBatch, TopicLog};
pub use queue::FileQueue;

pub use hearthq_core::{Error, Result};
