//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// One failed constraint on an inbound payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  /// The offending field, when the failure can be pinned to one.
  pub field:   Option<String>,
  pub message: String,
}

impl FieldError {
  pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      field:   Some(field.into()),
      message: message.into(),
    }
  }
}

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("validation failed: {0:?}")]
  Validation(Vec<FieldError>),

  /// The request body could not be read at all (wrong content type, too
  /// large, ...). Carries the status axum chose.
  #[error("rejected: {message}")]
  Rejected { status: StatusCode, message: String },

  #[error("{0}")]
  Internal(&'static str),

  /// A store failure. Only `context` reaches the client; the source is logged.
  #[error("{context}: {source}")]
  Store {
    context: &'static str,
    #[source]
    source:  Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ApiError {
  pub fn store<E>(context: &'static str, source: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    ApiError::Store {
      context,
      source: Box::new(source),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    let message = rejection.body_text();
    match rejection {
      JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
        ApiError::Validation(vec![FieldError {
          field: missing_field(&message).map(str::to_owned),
          message,
        }])
      }
      other => ApiError::Rejected {
        status: other.status(),
        message,
      },
    }
  }
}

/// Pull the field name out of serde's "missing field `name`" message.
fn missing_field(message: &str) -> Option<&str> {
  let rest = message.split_once("missing field `")?.1;
  rest.split_once('`').map(|(field, _)| field)
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Validation(errors) => {
        (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "detail": errors })))
          .into_response()
      }
      ApiError::Rejected { status, message } => {
        (status, Json(json!({ "detail": message }))).into_response()
      }
      ApiError::Internal(message) => {
        tracing::error!("{message}");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": message })))
          .into_response()
      }
      ApiError::Store { context, source } => {
        tracing::error!(error = %source, "{context}");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": context })))
          .into_response()
      }
    }
  }
}
