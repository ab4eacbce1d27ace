//! JSON body extractor that rejects with `ApiError`

use axum::extract::FromRequest;

use super::error::ApiError;

/// `axum::Json` whose rejection is a 400 `ValidationError` with the usual
/// `{error, code}` body instead of axum's plain-text 415/422
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
