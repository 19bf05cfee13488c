use axum::{
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use crate::core::error::{AppError, ErrorField};
use crate::features::auth::model::AuthenticatedUser;

/// JSON body for the browser-facing endpoints. Bodies that parse but do not
/// fit the DTO are reported as missing fields; rejections use `{"error"}`.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ErrorField;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|rejection| ErrorField(body_error(rejection)))
    }
}

fn body_error(rejection: JsonRejection) -> AppError {
    tracing::debug!("Rejected JSON body: {}", rejection.body_text());

    match rejection {
        JsonRejection::JsonDataError(_) => {
            AppError::Validation("Missing required fields".to_string())
        }
        JsonRejection::MissingJsonContentType(_) => {
            AppError::BadRequest("Expected an application/json body".to_string())
        }
        _ => AppError::BadRequest("Malformed JSON body".to_string()),
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("User not authenticated.".to_string()))
    }
}
