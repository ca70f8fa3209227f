//! Validated JSON extractor - Combines deserialization with validation.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use common::{AppError, AppResult};

/// JSON body that has passed its `validator` rules.
///
/// # Example
///
/// ```rust,ignore
/// async fn sign_in(ValidatedJson(payload): ValidatedJson<SignInRequest>) {
///     // payload.name is 3-20 word characters here
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        validate(&value)?;

        Ok(ValidatedJson(value))
    }
}

/// Run a payload's `validator` rules, outside of a JSON body too.
pub fn validate<T: Validate>(value: &T) -> AppResult<()> {
    value
        .validate()
        .map_err(|e| AppError::validation(format_validation_errors(&e)))
}

/// Join field errors into one message, sorted by field name.
fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 3, message = "name too short"))]
        name: String,
        #[validate(length(max = 2))]
        tag: String,
    }

    #[test]
    fn test_messages_fall_back_to_field_name() {
        let sample = Sample {
            name: "ab".into(),
            tag: "long".into(),
        };

        let message = format_validation_errors(&sample.validate().unwrap_err());

        assert_eq!(message, "name too short, tag is invalid");
    }
}
