use super::repository::UpdateDishPayload;
use crate::utils::validation::reject_reserved_keys;
use serde::Deserialize;
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

/// Fields the store assigns; clients never write them.
pub const RESERVED_FIELDS: [&str; 1] = ["id"];

pub fn validate_attributes(attributes: &Map<String, Value>) -> Result<(), ValidationError> {
    reject_reserved_keys(attributes, &RESERVED_FIELDS)
}

/// Partial dish body shared by the single and bulk patch routes.
#[derive(Deserialize, Validate)]
pub struct DishPatch {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,
    #[serde(flatten)]
    #[validate(custom(function = "validate_attributes"))]
    pub attributes: Map<String, Value>,
}

impl From<DishPatch> for UpdateDishPayload {
    fn from(patch: DishPatch) -> Self {
        Self {
            name: patch.name,
            attributes: patch.attributes,
        }
    }
}
