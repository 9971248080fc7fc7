pub mod request {
    use crate::modules::dish::types::validate_attributes;
    use serde::Deserialize;
    use serde_json::{Map, Value};
    use validator::Validate;

    #[derive(Deserialize, Validate)]
    pub struct Body {
        pub id: Option<String>,
        #[validate(length(min = 1, message = "Name must not be empty"))]
        pub name: String,
        #[serde(flatten)]
        #[validate(custom(function = "validate_attributes"))]
        pub attributes: Map<String, Value>,
    }

    pub struct Payload {
        pub id: String,
        pub body: Body,
    }
}

pub mod response {
    use crate::utils::validation;
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;
    use validator::ValidationErrors;

    pub enum Success {
        DishReplaced,
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::DishReplaced => StatusCode::NO_CONTENT.into_response(),
            }
        }
    }

    pub enum Error {
        FailedToValidate(ValidationErrors),
        IdMismatch,
        DishNotFound,
        FailedToReplaceDish,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::FailedToValidate(errors) => validation::into_response(errors).into_response(),
                Self::IdMismatch => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Dish id in the body does not match the path" })),
                )
                    .into_response(),
                Self::DishNotFound => (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Dish not found" })),
                )
                    .into_response(),
                Self::FailedToReplaceDish => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to replace dish" })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
