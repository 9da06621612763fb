use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, "Request failed");

        match self {
            AppError::Database(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DatabaseError, None)
            }
            AppError::InvalidInput(msg) => {
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, Some(msg))
            }
            AppError::Forbidden(msg) => {
                error_resp(StatusCode::FORBIDDEN, ErrorCode::Forbidden, Some(msg))
            }
            AppError::NotFound(msg) => {
                error_resp(StatusCode::NOT_FOUND, ErrorCode::NotFound, Some(msg))
            }
            AppError::AlreadyExists(msg) => {
                error_resp(StatusCode::CONFLICT, ErrorCode::AlreadyExists, Some(msg))
            }
            AppError::Upstream(msg) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::UpstreamError, Some(msg))
            }
            err @ (AppError::NoDirectoryConfigured | AppError::NotConfigured(_)) => error_resp(
                StatusCode::NOT_IMPLEMENTED,
                ErrorCode::NotConfigured,
                Some(err.to_string()),
            ),
            AppError::Internal(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError, None)
            }
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}
