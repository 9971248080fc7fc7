use axum::{http::StatusCode, Json};
use serde_json::{json, Map, Value};
use std::borrow::Cow;
use validator::{ValidationError, ValidationErrors};

pub fn into_response(errors: ValidationErrors) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({"errors": errors})))
}

/// Fails when a flattened JSON body carries a key the server owns.
pub fn reject_reserved_keys(
    body: &Map<String, Value>,
    reserved: &[&'static str],
) -> Result<(), ValidationError> {
    match reserved.iter().find(|key| body.contains_key(**key)) {
        None => Ok(()),
        Some(key) => Err(ValidationError::new("RESERVED_FIELD")
            .with_message(Cow::from(format!("`{key}` cannot be set by the client")))),
    }
}
