use axum::extract::{rejection::JsonRejection, FromRequest};
use tracing::warn;

use crate::error::AppError;

/// `axum::Json` whose rejections render as our 400 JSON error body instead of
/// axum's plain-text 415/422 responses.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "rejected request body");
        AppError::bad_request("Invalid request body")
    }
}
