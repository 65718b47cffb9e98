//! Core types shared between the hearthq storage engine and the HTTP
//! surface: the error taxonomy with its stable wire tokens, the
//! fixed-size segment meta record, topic name normalization, and the
//! `X-Sizes` header codec.

pub mod error;
pub mod meta;
pub mod sizes;
pub mod topic;

pub use error::{Error, Result};
pub use meta::{MetaRecord, RECORD_SIZE};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Offset bounds of a topic: `min_offset` is the base of the earliest
/// surviving segment, `max_offset` the next ID to be assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicInfo {
    #[serde(rename = "minOffset")]
    pub min_offset: u64,

    #[serde(rename = "maxOffset")]
    pub max_offset: u64,
}

/// Body of a `PATCH /topics/{topic}` request.
///
/// `truncate` is the minimum message ID to retain; `before` optionally
/// adds a wall-clock floor. A `truncate` of zero is a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyRequest {
    #[serde(default)]
    pub truncate: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_info_serializes_camel_case() {
        let info = TopicInfo {
            min_offset: 4,
            max_offset: 5,
        };
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(json, r#"{"minOffset":4,"maxOffset":5}"#);
    }

    #[test]
    fn modify_request_truncate_only() {
        let req: ModifyRequest = serde_json::from_str(r#"{"truncate":4}"#).unwrap();
        assert_eq!(req.truncate, 4);
        assert!(req.before.is_none());
    }

    #[test]
    fn modify_request_with_before() {
        let req: ModifyRequest =
            serde_json::from_str(r#"{"truncate":10,"before":"2026-01-02T03:04:05Z"}"#).unwrap();
        assert_eq!(req.truncate, 10);
        assert_eq!(req.before.unwrap().timestamp(), 1_767_323_045);
    }

    #[test]
    fn modify_request_rejects_bad_time() {
        let res = serde_json::from_str::<ModifyRequest>(r#"{"truncate":1,"before":"yesterday"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn modify_request_defaults() {
        let req: ModifyRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.truncate, 0);
        assert!(req.before.is_none());
    }
}
