//! Message consume endpoint.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use hearthq_core::{sizes, topic, Error};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ConsumeQuery {
    pub id: Option<String>,
    pub limit: Option<String>,
}

/// `GET /topics/{topic}?id=<n>&limit=<n>` — stream the concatenated
/// payloads starting at `id`, chunked straight off the segment file;
/// per-message sizes ride in `X-Sizes`. An empty result is 204 with
/// `X-Error: no-content`.
pub async fn consume(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Query(query): Query<ConsumeQuery>,
) -> Result<Response, ApiError> {
    let topic = topic::normalize(&raw)?;

    let id: i64 = query
        .id
        .as_deref()
        .unwrap_or("")
        .parse()
        .map_err(|_| Error::InvalidMessageId)?;
    let limit = parse_limit(query.limit.as_deref(), state.default_limit)?;

    let batch = state.queue.consume(&topic, id, limit).await?;
    if batch.is_empty() {
        return Err(Error::NoContent.into());
    }
    state.metrics.consume_msgs(batch.len());

    let size_header = sizes::format(&batch.sizes);
    Ok((
        [
            (header::CONTENT_TYPE.as_str(), "application/octet-stream"),
            ("x-sizes", size_header.as_str()),
        ],
        batch.body,
    )
        .into_response())
}

/// A missing, empty, or negative `limit` selects the server default;
/// anything else must parse, and a parsed value of zero falls back to
/// the default as well.
fn parse_limit(raw: Option<&str>, default: i64) -> Result<i64, Error> {
    match raw {
        None => Ok(default),
        Some(value) if value.is_empty() || value.starts_with('-') => Ok(default),
        Some(value) => {
            let limit = value.parse::<i64>().map_err(|_| Error::InvalidMessageLimit)?;
            Ok(if limit <= 0 { default } else { limit })
        }
    }
}
