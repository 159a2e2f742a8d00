//! Extractors whose rejections use the structured error body.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};

use super::error::ApiError;

/// `axum::Json` that rejects with a 400 `ApiError`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Trimmed, non-empty text no longer than `max` characters.
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("{field} is required")));
    }
    check_length(field, trimmed, max)?;
    Ok(trimmed.to_string())
}

/// Like [`required_text`] for optional fields; blank becomes `None`.
pub fn optional_text(
    field: &str,
    value: Option<String>,
    max: usize,
) -> Result<Option<String>, ApiError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => {
            check_length(field, trimmed, max)?;
            Ok(Some(trimmed.to_string()))
        }
    }
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.chars().count() > max {
        return Err(ApiError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_trims_and_rejects_blank() {
        assert_eq!(required_text("title", "  Fitting ", 50).unwrap(), "Fitting");
        assert!(matches!(
            required_text("title", "   ", 50),
            Err(ApiError::BadRequest(msg)) if msg == "title is required"
        ));
        assert!(required_text("title", "abcdef", 5).is_err());
    }

    #[test]
    fn optional_text_blank_is_none() {
        assert_eq!(optional_text("phone", Some("  ".into()), 10).unwrap(), None);
        assert_eq!(optional_text("phone", None, 10).unwrap(), None);
        assert_eq!(
            optional_text("phone", Some(" 555 ".into()), 10).unwrap().as_deref(),
            Some("555")
        );
        assert!(optional_text("phone", Some("x".repeat(11)), 10).is_err());
    }
}
