use axum::{
    extract::{FromRequest, Request},
    Json,
};
use blog_models::Validate;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body that has been deserialized and passed [`Validate`].
///
/// Both malformed bodies and failed validation reject with 422.
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Unprocessable(rejection.body_text()))?;
        value
            .validate()
            .map_err(|e| ApiError::Unprocessable(e.to_string()))?;
        Ok(Self(value))
    }
}
