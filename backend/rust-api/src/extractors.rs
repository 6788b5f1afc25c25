use axum::{
    extract::{FromRequest, Request},
    Json,
};
use validator::Validate;

use crate::handlers::ApiError;

/// JSON body extractor that validates the payload and reports both parse and
/// validation failures as JSON `400` bodies.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: serde::de::DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                let message = format!("Failed to parse JSON request body: {}", rejection);
                tracing::warn!("{}", message);
                ApiError::BadRequest(message)
            })?;

        value.validate().map_err(|e| {
            tracing::warn!("Request validation failed: {}", e);
            ApiError::BadRequest(format!("Validation error: {}", e))
        })?;

        Ok(ValidatedJson(value))
    }
}
