//! Queue configuration.
//!
//! Controls where topic data lives and how the log engine behaves:
//!
//! - **roots**: one or more directories; every topic is mirrored
//!   across all of them (the first root serves reads and listings)
//! - **entries_per_file**: segment roll threshold in messages
//! - **fd_cache**: whether sealed-segment descriptors are kept in the
//!   LRU cache or opened per call
//! - **fd_cache_size**: maximum number of cached descriptors

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Root directories; topics are mirrored across all of them.
    #[serde(default = "default_roots")]
    pub roots: Vec<PathBuf>,

    /// Messages per segment before rolling (default: 5000).
    #[serde(default = "default_entries_per_file")]
    pub entries_per_file: u64,

    /// Cache descriptors of sealed segments (default: true).
    #[serde(default = "default_fd_cache")]
    pub fd_cache: bool,

    /// Maximum number of cached descriptors (default: 128).
    #[serde(default = "default_fd_cache_size")]
    pub fd_cache_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            roots: default_roots(),
            entries_per_file: default_entries_per_file(),
            fd_cache: default_fd_cache(),
            fd_cache_size: default_fd_cache_size(),
        }
    }
}

fn default_roots() -> Vec<PathBuf> {
    vec![PathBuf::from(".hearthq")]
}

fn default_entries_per_file() -> u64 {
    5000
}

fn default_fd_cache() -> bool {
    true
}

fn default_fd_cache_size() -> usize {
    128
}
