//! Message produce endpoint.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use futures_util::TryStreamExt;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_util::io::StreamReader;

use hearthq_core::{sizes, topic, Error};

use crate::error::ApiError;
use crate::AppState;

/// `POST /topics/{topic}` — append the messages described by the
/// `X-Sizes` header; the body is their concatenation and is streamed
/// into the log as it arrives. All messages in the batch share the
/// arrival timestamp.
pub async fn produce(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> Result<StatusCode, ApiError> {
    let topic = topic::normalize(&raw)?;

    let header = headers
        .get("x-sizes")
        .and_then(|value| value.to_str().ok())
        .ok_or(Error::InvalidHeaderSizes)?;
    let sizes = sizes::parse(header)?;

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let mut reader = StreamReader::new(
        body.into_data_stream()
            .map_err(|e| std::io::Error::other(e)),
    );
    state
        .queue
        .produce(&topic, &sizes, timestamp, &mut reader)
        .await?;
    state.metrics.produce_msgs(sizes.len());
    Ok(StatusCode::NO_CONTENT)
}
