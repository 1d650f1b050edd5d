use std::time::Duration;

use axum::Json;
use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::llm::ResponderError;

#[derive(Debug)]
pub enum AppError {
    NotFound(&'static str),
    BadRequest(&'static str),
    RateLimited { retry_after: Duration },
    Responder(ResponderError),
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl From<ResponderError> for AppError {
    fn from(e: ResponderError) -> Self {
        AppError::Responder(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AppError::NotFound(resource) => (StatusCode::NOT_FOUND, format!("{} not found", resource)),
            AppError::RateLimited { retry_after } => {
                // 向上取整，至少 1 秒
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, secs.max(1).to_string())],
                    "Rate limit exceeded",
                )
                    .into_response();
            }
            AppError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason.to_string()),
            AppError::Responder(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}
