use axum::{
    Json,
    extract::{
        FromRequest, Path, Request,
        rejection::{JsonRejection, PathRejection},
    },
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::app_error::AppError;

/// JSON body extractor that runs the body's `validator` rules before the handler sees it.
/// Malformed bodies and rule violations both surface as [`AppError::Validation`].
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(malformed_body)?;
        value.validate().map_err(field_errors)?;
        Ok(ValidatedJson(value))
    }
}

/// Takes a field that a `required` rule has already checked.
pub fn checked<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::validation(field, "is required"))
}

/// Unwraps an `{id}` path segment, turning a non-numeric id into a validation error.
pub fn path_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    id.map(|Path(id)| id)
        .map_err(|rejection| AppError::validation("id", rejection.body_text()))
}

fn malformed_body(rejection: JsonRejection) -> AppError {
    AppError::validation("body", rejection.body_text())
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Flattens validator output into sorted `field: reason` lines.
pub fn field_errors(errors: ValidationErrors) -> AppError {
    let mut lines: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, failures)| {
            let field = camel_case(&field.to_string());
            failures.iter().map(move |failure| {
                let reason = failure
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| failure.code.to_string());
                format!("{}: {}", field, reason)
            })
        })
        .collect();
    lines.sort();
    AppError::Validation(lines)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize, Validate)]
    struct Probe {
        #[validate(required(message = "Product ID is required"))]
        product_id: Option<i64>,
        #[validate(range(min = 1, message = "Quantity must be positive"))]
        quantity: Option<i32>,
    }

    #[test]
    fn converts_field_names_to_camel_case() {
        assert_eq!(camel_case("total_amount"), "totalAmount");
        assert_eq!(camel_case("status"), "status");
    }

    #[test]
    fn collects_every_failing_field() {
        let probe = Probe {
            product_id: None,
            quantity: Some(0),
        };
        let AppError::Validation(lines) = field_errors(probe.validate().unwrap_err()) else {
            panic!("expected a validation error");
        };
        assert_eq!(
            lines,
            vec![
                "productId: Product ID is required".to_string(),
                "quantity: Quantity must be positive".to_string(),
            ]
        );
    }
}
