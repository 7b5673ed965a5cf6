//! Handler for `GET /projects`.
//!
//! Returns up to [`LIMIT`] stored projects. While the collection is empty the
//! portfolio grid is fed a fixed set of demo entries instead.

use axum::{
  Json,
  extract::State,
  response::{IntoResponse, Response},
};
use folio_core::{Filter, store::DocumentStore};
use serde::Serialize;

use crate::{AppState, error::ApiError};

pub const COLLECTION: &str = "projects";
pub const LIMIT: usize = 32;

/// The shape the frontend expects for a portfolio entry.
///
/// Stored documents are returned as-is and are not checked against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
  pub title:    String,
  pub subtitle: Option<String>,
  pub image:    Option<String>,
  pub tags:     Vec<String>,
  pub url:      Option<String>,
}

impl Project {
  fn demo(title: &str, subtitle: &str, image: &str, tags: &[&str]) -> Self {
    Self {
      title:    title.to_owned(),
      subtitle: Some(subtitle.to_owned()),
      image:    Some(image.to_owned()),
      tags:     tags.iter().map(|t| (*t).to_owned()).collect(),
      url:      Some("#".to_owned()),
    }
  }
}

/// Demo entries served while no projects are stored.
pub fn fallback() -> Vec<Project> {
  vec![
    Project::demo(
      "MetaBloom",
      "Generative identity system",
      "/covers/metabloom.jpg",
      &["gen-art", "branding", "webgl"],
    ),
    Project::demo(
      "NEON/GRID",
      "Realtime shader microsite",
      "/covers/neongrid.jpg",
      &["threejs", "shaders"],
    ),
    Project::demo(
      "FOLD",
      "Experimental editorial",
      "/covers/fold.jpg",
      &["typography", "motion"],
    ),
  ]
}

/// `GET /projects`
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<Response, ApiError>
where
  S: DocumentStore + 'static,
{
  let docs = state
    .store
    .read(COLLECTION, Filter::new(), LIMIT)
    .await
    .map_err(|e| ApiError::store("Failed to load projects", e))?;

  if docs.is_empty() {
    return Ok(Json(fallback()).into_response());
  }
  Ok(Json(docs).into_response())
}
