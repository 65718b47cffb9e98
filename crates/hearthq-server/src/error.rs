//! Mapping from the core error taxonomy to HTTP responses.
//!
//! Every error becomes a status code plus an `X-Error` header carrying
//! the stable token; bodies stay empty. Clients branch on the token,
//! not the text.

use axum::http::{header::HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use hearthq_core::Error;

pub static X_ERROR: HeaderName = HeaderName::from_static("x-error");

/// Newtype so `?` works in handlers returning `Result<_, ApiError>`.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::TopicDoesNotExist => StatusCode::NOT_FOUND,
        Error::TopicAlreadyExists => StatusCode::CONFLICT,
        Error::InvalidTopic
        | Error::InvalidHeaderSizes
        | Error::InvalidMessageId
        | Error::InvalidMessageLimit
        | Error::InvalidBodyMissing
        | Error::InvalidBodyJson => StatusCode::BAD_REQUEST,
        Error::NoContent => StatusCode::NO_CONTENT,
        Error::ShortWrite | Error::Integrity(_) | Error::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, token = self.0.token(), "request failed");
        } else {
            tracing::debug!(error = %self.0, token = self.0.token(), "request rejected");
        }
        let mut response = status.into_response();
        response
            .headers_mut()
            .insert(X_ERROR.clone(), HeaderValue::from_static(self.0.token()));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(status_for(&Error::TopicDoesNotExist), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&Error::TopicAlreadyExists), StatusCode::CONFLICT);
        assert_eq!(status_for(&Error::InvalidTopic), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&Error::NoContent), StatusCode::NO_CONTENT);
        assert_eq!(
            status_for(&Error::ShortWrite),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn response_carries_the_token() {
        let response = ApiError(Error::NoContent).into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers().get(&X_ERROR).unwrap(),
            &HeaderValue::from_static("no-content")
        );
    }
}
