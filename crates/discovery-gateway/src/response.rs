use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use discovery_core::{ErrorKind, ENGINE_VERSION, SCHEMA_VERSION};
use serde::Serialize;

/// Envelope every endpoint returns, success or failure, stamped per the external
/// interface contract: engine version, schema version, timestamp, and the request id
/// for trace correlation.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub engine_version: String,
    pub schema_version: u32,
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, request_id: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            engine_version: ENGINE_VERSION.to_string(),
            schema_version: SCHEMA_VERSION,
            timestamp: Utc::now(),
            request_id: request_id.into(),
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            engine_version: ENGINE_VERSION.to_string(),
            schema_version: SCHEMA_VERSION,
            timestamp: Utc::now(),
            request_id: request_id.into(),
        }
    }
}

/// Uniform error type for every handler. Carries the HTTP status to respond with and,
/// where the failure originated from a typed collaborator error, the `ErrorKind` so the
/// JSON body names a stable machine-readable reason alongside the human message.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub kind: Option<ErrorKind>,
    pub message: String,
    pub request_id: String,
}

impl AppError {
    pub fn with_status(status: StatusCode, message: impl std::fmt::Display, request_id: impl Into<String>) -> Self {
        Self { status, kind: None, message: message.to_string(), request_id: request_id.into() }
    }

    pub fn from_kind(kind: ErrorKind, message: impl std::fmt::Display, request_id: impl Into<String>) -> Self {
        Self { status: status_for_kind(kind), kind: Some(kind), message: message.to_string(), request_id: request_id.into() }
    }
}

fn status_for_kind(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Timeout | ErrorKind::JobTimeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Upstream5xx | ErrorKind::Malformed => StatusCode::BAD_GATEWAY,
        ErrorKind::UniverseFloorBreached | ErrorKind::CacheUnavailable | ErrorKind::QueueUnavailable => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ErrorKind::LockContended => StatusCode::CONFLICT,
        ErrorKind::ScoringSkipped => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::warn!(status = %self.status, kind = ?self.kind, "request failed: {}", self.message);
        let body = ApiResponse::<()>::failure(self.message, self.request_id);
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_rate_limited_to_429() {
        assert_eq!(status_for_kind(ErrorKind::RateLimited), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn maps_lock_contended_to_409() {
        assert_eq!(status_for_kind(ErrorKind::LockContended), StatusCode::CONFLICT);
    }

    #[test]
    fn maps_universe_floor_to_503() {
        assert_eq!(status_for_kind(ErrorKind::UniverseFloorBreached), StatusCode::SERVICE_UNAVAILABLE);
    }
}
