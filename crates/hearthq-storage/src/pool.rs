//! Process-wide buffer pool.
//!
//! Produce copies and meta-record reads churn through short-lived
//! byte buffers sized to the batch. Pooling them keeps the allocator
//! out of the hot path; buffers grow to the largest batch seen and
//! the pool holds at most a handful of them.

use lazy_static::lazy_static;
use std::sync::Mutex;

const MAX_POOLED: usize = 8;

lazy_static! {
    static ref POOL: Mutex<Vec<Vec<u8>>> = Mutex::new(Vec::new());
}

/// Take a buffer of exactly `len` bytes, reusing a pooled allocation
/// when one is available.
pub fn get(len: usize) -> Vec<u8> {
    let mut buf = POOL
        .lock()
        .expect("buffer pool lock")
        .pop()
        .unwrap_or_default();
    buf.resize(len, 0);
    buf
}

/// Return a buffer to the pool.
pub fn put(mut buf: Vec<u8>) {
    buf.clear();
    let mut pool = POOL.lock().expect("buffer pool lock");
    if pool.len() < MAX_POOLED {
        pool.push(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_requested_length() {
        let buf = get(64);
        assert_eq!(buf.len(), 64);
        put(buf);
    }

    #[test]
    fn reused_buffers_come_back_zeroed() {
        let mut buf = get(16);
        buf[0] = 0xAB;
        put(buf);

        let again = get(8);
        assert_eq!(again.len(), 8);
        assert!(again.iter().all(|&b| b == 0));
        put(again);
    }

    #[test]
    fn zero_length_get() {
        let buf = get(0);
        assert!(buf.is_empty());
        put(buf);
    }
}
