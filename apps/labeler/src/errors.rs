use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::export::ExportError;
use crate::layout::LayoutError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Layout(e) if e.is_configuration() => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "LAYOUT_CONFIGURATION",
                e.to_string(),
            ),
            AppError::Layout(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "LAYOUT_ERROR",
                e.to_string(),
            ),
            AppError::Export(ExportError::DeviceMismatch { .. }) => (
                StatusCode::PRECONDITION_FAILED,
                "DEVICE_MISMATCH",
                self.to_string(),
            ),
            AppError::Export(ExportError::AssetNotFound(id)) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("asset {id} not found"),
            ),
            AppError::Export(ExportError::Layout(e)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "LAYOUT_CONFIGURATION",
                e.to_string(),
            ),
            AppError::Export(e) => {
                tracing::error!("Export error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXPORT_ERROR",
                    "Label export failed".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
