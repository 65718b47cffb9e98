//! Topic name normalization.
//!
//! Topic names arrive from URL paths and become directory names, so
//! they are lowercased and lexically cleaned before touching the
//! filesystem. Names that are empty after cleaning, or that would
//! escape the root (`..`), are rejected.

use crate::error::{Error, Result};

/// Normalize a raw topic name: lowercase, collapse `.` and empty path
/// segments, resolve `..` lexically. Errors with [`Error::InvalidTopic`]
/// when nothing remains or the name climbs out of the root.
pub fn normalize(raw: &str) -> Result<String> {
    let lowered = raw.to_lowercase();
    let mut parts: Vec<&str> = Vec::new();
    for segment in lowered.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(Error::InvalidTopic);
                }
            }
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return Err(Error::InvalidTopic);
    }
    Ok(parts.join("/"))
}
