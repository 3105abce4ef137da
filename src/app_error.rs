use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Local, NaiveDateTime};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Serialize;
use utoipa::ToSchema;

use crate::datetime;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(Vec<String>),

    #[error("{kind} not found with id: {id}")]
    NotFound { kind: &'static str, id: i64 },

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    BusinessRule(String),

    #[error(transparent)]
    Other(anyhow::Error),
}

impl AppError {
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        AppError::Validation(vec![format!("{}: {}", field, reason.into())])
    }

    pub fn not_found(kind: &'static str, id: i64) -> Self {
        AppError::NotFound { kind, id }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::BusinessRule(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn unique_violation(err: &DieselError) -> Option<String> {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            Some(info.message().to_string())
        }
        _ => None,
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DieselError>().and_then(unique_violation) {
            Some(message) => AppError::Duplicate(message),
            None => AppError::Other(err),
        }
    }
}

impl From<DieselError> for AppError {
    fn from(err: DieselError) -> Self {
        match unique_violation(&err) {
            Some(message) => AppError::Duplicate(message),
            None => AppError::Other(err.into()),
        }
    }
}

/// Body of every non-2xx response.
#[derive(Serialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    pub status: u16,
    #[serde(with = "datetime::local_format")]
    #[schema(value_type = String, example = "2024-01-15T10:30:00")]
    pub timestamp: NaiveDateTime,
    pub errors: Vec<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (message, errors) = match self {
            AppError::Validation(errors) => ("Validation failed".to_string(), errors),
            AppError::Other(err) => {
                tracing::error!("Unhandled error: {:#}", err);
                ("An unexpected error occurred".to_string(), Vec::new())
            }
            other => (other.to_string(), Vec::new()),
        };

        let body = ErrorResponse {
            message,
            status: status.as_u16(),
            timestamp: Local::now().naive_local(),
            errors,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn not_found_message_names_kind_and_id() {
        let err = AppError::not_found("Order", 42);
        assert_eq!(err.to_string(), "Order not found with id: 42");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn business_rule_maps_to_422() {
        let err = AppError::BusinessRule("cart is empty".into());
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn validation_formats_field_and_reason() {
        let AppError::Validation(errors) = AppError::validation("size", "must be positive") else {
            panic!("expected a validation error");
        };
        assert_eq!(errors, vec!["size: must be positive".to_string()]);
    }

    #[test]
    fn diesel_not_found_behind_context_is_internal() {
        let result: Result<(), DieselError> = Err(DieselError::NotFound);
        let err: AppError = result.context("Failed to get order").unwrap_err().into();
        assert!(matches!(err, AppError::Other(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
