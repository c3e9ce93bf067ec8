//! JSON body extractor that reports shape and rule violations alike.

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;

use actix_web::{Error, FromRequest, HttpRequest, dev::Payload, web};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::middleware::error::AppError;

/// Deserialized and validated request body.
///
/// Syntax errors keep the `Invalid JSON` response from the `JsonConfig`
/// handler. A body that parses but has the wrong shape (not an object,
/// wrong type, `null` for a required field) fails validation instead, with
/// one detail per offending field.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> FromRequest for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let body = web::Json::<Value>::from_request(req, payload);

        Box::pin(async move {
            let web::Json(value) = body.await?;
            let value: T = decode(value)?;
            value.validate().map_err(AppError::from)?;
            Ok::<Self, Error>(ValidatedJson(value))
        })
    }
}

/// Convert a parsed body into `T`, naming the fields serde rejects.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    let Value::Object(fields) = value else {
        let mut errors = ValidationErrors::new();
        errors.add(
            "body",
            ValidationError::new("type").with_message("Expected a JSON object".into()),
        );
        return Err(errors.into());
    };

    let err = match serde_json::from_value::<T>(Value::Object(fields.clone())) {
        Ok(decoded) => return Ok(decoded),
        Err(err) => err,
    };

    // Request types default every required field, so a single-field object
    // only fails when that field itself has the wrong shape.
    let mut errors = ValidationErrors::new();
    for (key, field) in fields {
        let single = Map::from_iter([(key.clone(), field)]);
        if let Err(field_err) = serde_json::from_value::<T>(Value::Object(single)) {
            push(&mut errors, key, field_err.to_string());
        }
    }
    if errors.is_empty() {
        push(&mut errors, "body".to_string(), err.to_string());
    }

    Err(errors.into())
}

fn push(errors: &mut ValidationErrors, field: String, message: String) {
    let entry = errors
        .0
        .entry(Cow::Owned(field))
        .or_insert_with(|| ValidationErrorsKind::Field(Vec::new()));
    if let ValidationErrorsKind::Field(list) = entry {
        list.push(ValidationError::new("type").with_message(message.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_shared::dto::{CreatePostRequest, CreateUserRequest};
    use serde_json::json;

    fn fields(err: AppError) -> Vec<String> {
        let errors = match err {
            AppError::Validation(errors) => errors,
            other => panic!("expected a validation error, got {other:?}"),
        };
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_keys()
            .map(|k| k.into_owned())
            .collect();
        fields.sort();
        fields
    }

    #[test]
    fn test_decode_accepts_well_formed_object() {
        let req: CreateUserRequest =
            decode(json!({ "email": "a@example.com", "password": "password123" })).unwrap();
        assert_eq!(req.email, "a@example.com");
    }

    #[test]
    fn test_decode_names_wrongly_typed_fields() {
        let err = decode::<CreateUserRequest>(json!({
            "email": null,
            "password": 12345678,
            "firstName": "Ada"
        }))
        .unwrap_err();
        assert_eq!(fields(err), vec!["email", "password"]);
    }

    #[test]
    fn test_decode_rejects_non_objects() {
        let err =
            decode::<CreateUserRequest>(json!(["a@example.com", "password123", null, null]))
                .unwrap_err();
        assert_eq!(fields(err), vec!["body"]);

        let err = decode::<CreatePostRequest>(json!("text")).unwrap_err();
        assert_eq!(fields(err), vec!["body"]);
    }

    #[test]
    fn test_decode_reports_nested_type_errors() {
        let err = decode::<CreatePostRequest>(json!({
            "title": "t",
            "content": "c",
            "slug": "s",
            "categoryIds": "not-a-list"
        }))
        .unwrap_err();
        assert_eq!(fields(err), vec!["categoryIds"]);
    }
}
