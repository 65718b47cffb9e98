//! The fixed-size segment meta record.
//!
//! A segment's `.dat` file is a flat array of these records, one per
//! message, in little-endian byte order:
//!
//! ```text
//! ┌───────────────┬───────────────┐
//! │ endByte (u64) │ timestamp(u64)│   16 bytes per record
//! └───────────────┴───────────────┘
//! ```
//!
//! `end_byte` is the offset just past the message's payload in the
//! `.hrq` data file; the start byte of record `i` is record `i-1`'s
//! `end_byte` (or 0 for the first record). A record's message ID is
//! implicit: `segment base + record index`. The record size is a power
//! of two so that `id → file offset` is a shift, and it is fixed for
//! the lifetime of a data directory.

use bytes::{BufMut, BytesMut};

use crate::error::{Error, Result};

/// On-disk size of one meta record, in bytes.
pub const RECORD_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaRecord {
    pub end_byte: u64,
    pub timestamp: u64,
}

impl MetaRecord {
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_u64_le(self.end_byte);
        buf.put_u64_le(self.timestamp);
    }

    pub fn decode(buf: &[u8; RECORD_SIZE]) -> Self {
        Self {
            end_byte: u64::from_le_bytes(buf[0..8].try_into().expect("8-byte slice")),
            timestamp: u64::from_le_bytes(buf[8..16].try_into().expect("8-byte slice")),
        }
    }
}

/// Byte offset of record `index` within a meta file.
pub fn record_offset(index: u64) -> u64 {
    index * RECORD_SIZE as u64
}

/// Decode a run of contiguous meta records.
///
/// The buffer length must be an exact multiple of [`RECORD_SIZE`];
/// anything else means the caller sliced the file incorrectly.
pub fn decode_records(buf: &[u8]) -> Result<Vec<MetaRecord>> {
    if buf.len() % RECORD_SIZE != 0 {
        return Err(Error::Integrity(format!(
            "meta buffer of {} bytes is not a multiple of the record size",
            buf.len()
        )));
    }
    Ok(buf
        .chunks_exact(RECORD_SIZE)
        .map(|chunk| MetaRecord::decode(chunk.try_into().expect("exact chunk")))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_size_is_power_of_two() {
        assert!(RECORD_SIZE.is_power_of_two());
    }

    #[test]
    fn encode_decode_roundtrip() {
        let rec = MetaRecord {
            end_byte: 0x0102_0304_0506_0708,
            timestamp: 1_700_000_000,
        };
        let mut buf = BytesMut::new();
        rec.encode_into(&mut buf);
        assert_eq!(buf.len(), RECORD_SIZE);
        let decoded = MetaRecord::decode(&buf[..].try_into().unwrap());
        assert_eq!(decoded, rec);
    }

    #[test]
    fn encoding_is_little_endian() {
        let rec = MetaRecord {
            end_byte: 1,
            timestamp: 2,
        };
        let mut buf = BytesMut::new();
        rec.encode_into(&mut buf);
        assert_eq!(&buf[..], &[1, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn decode_records_many() {
        let mut buf = BytesMut::new();
        for i in 1..=3u64 {
            MetaRecord {
                end_byte: i * 10,
                timestamp: 100 + i,
            }
            .encode_into(&mut buf);
        }
        let records = decode_records(&buf).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].end_byte, 10);
        assert_eq!(records[2].end_byte, 30);
        assert_eq!(records[2].timestamp, 103);
    }

    #[test]
    fn decode_records_rejects_torn_buffer() {
        let buf = vec![0u8; RECORD_SIZE + 3];
        assert!(decode_records(&buf).is_err());
    }

    #[test]
    fn record_offset_scales() {
        assert_eq!(record_offset(0), 0);
        assert_eq!(record_offset(1), 16);
        assert_eq!(record_offset(5000), 80_000);
    }
}
