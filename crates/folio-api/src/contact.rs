//! Handler for `POST /contact`.
//!
//! Body: [`ContactSubmission`]. Persisted verbatim into the `contact`
//! collection; returns `{"status":"received","id":"..."}`.

use axum::{Json, extract::State};
use folio_core::{
  document::{document_id, to_document},
  store::DocumentStore,
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  error::{ApiError, FieldError},
  extract::{Valid, Validate, max_chars},
};

pub const COLLECTION: &str = "contact";

pub const NAME_MAX: usize = 120;
pub const EMAIL_MAX: usize = 160;
pub const MESSAGE_MAX: usize = 5000;

/// A message sent through the site's contact form.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContactSubmission {
  pub name:    String,
  pub email:   String,
  pub message: String,
  pub company: Option<String>,
  pub topic:   Option<String>,
}

impl Validate for ContactSubmission {
  fn validate(&self) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    max_chars(&mut errors, "name", &self.name, NAME_MAX);
    max_chars(&mut errors, "email", &self.email, EMAIL_MAX);
    max_chars(&mut errors, "message", &self.message, MESSAGE_MAX);
    if errors.is_empty() { Ok(()) } else { Err(errors) }
  }
}

#[derive(Debug, Serialize)]
pub struct Receipt {
  pub status: &'static str,
  pub id:     String,
}

/// `POST /contact`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  Valid(submission): Valid<ContactSubmission>,
) -> Result<Json<Receipt>, ApiError>
where
  S: DocumentStore + 'static,
{
  const FAILED: &str = "Failed to store message";

  let data = to_document(&submission).map_err(|e| ApiError::store(FAILED, e))?;
  let doc = state
    .store
    .create(COLLECTION, data)
    .await
    .map_err(|e| ApiError::store(FAILED, e))?;

  let id = document_id(&doc).ok_or(ApiError::Internal(FAILED))?;
  tracing::info!(id, "contact submission received");

  Ok(Json(Receipt {
    status: "received",
    id:     id.to_owned(),
  }))
}
