//! A JSON extractor that also enforces field constraints.

use axum::{
  Json,
  extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, FieldError};

/// Field-level constraints checked after deserialization.
pub trait Validate {
  /// Every violated constraint, or `Ok` if there are none.
  fn validate(&self) -> Result<(), Vec<FieldError>>;
}

/// Like [`Json`], but rejects bodies that fail [`Validate`] and reports
/// malformed JSON in the same `{"detail": [...]}` shape.
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
  T: DeserializeOwned + Validate + Send,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let Json(value) = Json::<T>::from_request(req, state).await?;
    value.validate().map_err(ApiError::Validation)?;
    Ok(Valid(value))
  }
}

/// Check that `value` has at most `max` characters.
pub fn max_chars(
  errors: &mut Vec<FieldError>,
  field: &str,
  value: &str,
  max: usize,
) {
  if value.chars().count() > max {
    errors.push(FieldError::new(
      field,
      format!("String should have at most {max} characters"),
    ));
  }
}
