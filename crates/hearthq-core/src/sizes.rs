//! Codec for the `X-Sizes` header.
//!
//! A produce request carries one body that is the concatenation of N
//! messages; `X-Sizes: n1,n2,…` tells the broker where the boundaries
//! are. Consume responses use the same header in the other direction.

use crate::error::{Error, Result};

/// Parse an `X-Sizes` header value into per-message byte counts.
///
/// At least one size is required; every entry must be a base-10
/// unsigned integer.
pub fn parse(header: &str) -> Result<Vec<u64>> {
    let mut sizes = Vec::new();
    for part in header.split(',') {
        let size = part
            .trim()
            .parse::<u64>()
            .map_err(|_| Error::InvalidHeaderSizes)?;
        sizes.push(size);
    }
    if sizes.is_empty() {
        return Err(Error::InvalidHeaderSizes);
    }
    Ok(sizes)
}

/// Render sizes back into header form.
pub fn format(sizes: &[u64]) -> String {
    sizes
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
