//! Topic management endpoints: list, create, delete, modify.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use hearthq_core::{topic, Error, ModifyRequest};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub regex: String,
}

/// `GET /topics` — all topics surviving the prefix/suffix/regex
/// filters, as CSV by default or JSON when the client asks for it.
pub async fn list_topics(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let topics = state
        .queue
        .list_topics(&query.prefix, &query.suffix, &query.regex)
        .await?;

    let wants_json = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .map(|accept| accept == "application/json")
        .unwrap_or(false);

    if wants_json {
        Ok(Json(serde_json::json!({ "topics": topics })).into_response())
    } else {
        Ok((
            [(header::CONTENT_TYPE, "text/csv")],
            topics.join(","),
        )
            .into_response())
    }
}

/// `PUT /topics/{topic}` — 201 on success, conflict when it exists.
pub async fn create_topic(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<StatusCode, ApiError> {
    let topic = topic::normalize(&raw)?;
    state.queue.create_topic(&topic).await?;
    Ok(StatusCode::CREATED)
}

/// `DELETE /topics/{topic}` — 204 on success.
pub async fn delete_topic(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<StatusCode, ApiError> {
    let topic = topic::normalize(&raw)?;
    state.queue.delete_topic(&topic).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PATCH /topics/{topic}` — truncate by minimum retained ID and
/// optionally by time. A zero `truncate` is a no-op answered with 204;
/// otherwise the response carries the topic's new offset bounds.
pub async fn modify_topic(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let topic = topic::normalize(&raw)?;
    if body.is_empty() {
        return Err(Error::InvalidBodyMissing.into());
    }
    let request: ModifyRequest =
        serde_json::from_slice(&body).map_err(|_| Error::InvalidBodyJson)?;

    if request.truncate == 0 {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let info = state.queue.modify_topic(&topic, request).await?;
    Ok(Json(info).into_response())
}
