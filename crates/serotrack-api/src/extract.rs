//! Request-body extraction with the API's error contract.
//!
//! axum's default `Json` rejection answers 422 with a plain-text body. The
//! register's validation contract is 400 with the `{"error": ...}` JSON
//! shape — a malformed titer must be rejected before anything touches
//! storage, in the same format every other failure uses — so body
//! extraction goes through this wrapper instead.

use axum::{
  extract::{FromRequest, Request, rejection::JsonRejection},
  response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::ApiError;

/// Drop-in replacement for [`axum::Json`] whose rejection is
/// [`ApiError::Validation`].
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
  axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    match axum::Json::<T>::from_request(req, state).await {
      Ok(axum::Json(value)) => Ok(Self(value)),
      Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
    }
  }
}

impl<T: Serialize> IntoResponse for Json<T> {
  fn into_response(self) -> Response { axum::Json(self.0).into_response() }
}
