//! JSON HTTP API for the Folio portfolio backend.
//!
//! Exposes an axum [`Router`] backed by any [`DocumentStore`].
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/` | Liveness marker |
//! | `GET`  | `/test` | Store diagnostics; never fails |
//! | `POST` | `/contact` | Body: [`contact::ContactSubmission`] |
//! | `GET`  | `/projects` | Stored projects, or demo entries when empty |

pub mod contact;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod projects;

pub use error::ApiError;

use std::sync::Arc;

use axum::{
  Router,
  http::{HeaderValue, header::InvalidHeaderValue},
  routing::{get, post},
};
use folio_core::store::DocumentStore;
use serde::Deserialize;
use tower_http::{
  cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
  trace::TraceLayer,
};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Which [`DocumentStore`] implementation the server runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  #[default]
  Mongo,
  /// `database_url` is a file path, or `:memory:`.
  Sqlite,
}

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment. Every key has a default.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  pub backend:       Backend,
  pub database_url:  String,
  pub database_name: String,
  /// Allowed cross-origin value; `*` allows any origin.
  pub frontend_url:  String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:          "0.0.0.0".to_owned(),
      port:          8000,
      backend:       Backend::Mongo,
      database_url:  "mongodb://localhost:27017".to_owned(),
      database_name: "appdb".to_owned(),
      frontend_url:  "*".to_owned(),
    }
  }
}

/// A configuration that cannot be served.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("backend \"sqlite\" needs database_url set to a file path or \":memory:\", got {0:?}")]
  SqliteNeedsPath(String),
}

impl ServerConfig {
  /// Reject combinations that would only fail once requests arrive.
  pub fn check(&self) -> Result<(), ConfigError> {
    let is_mongo_url = self.database_url.starts_with("mongodb://")
      || self.database_url.starts_with("mongodb+srv://");
    if self.backend == Backend::Sqlite && is_mongo_url {
      return Err(ConfigError::SqliteNeedsPath(self.database_url.clone()));
    }
    Ok(())
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

impl<S> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    Self {
      store:  Arc::new(store),
      config: Arc::new(config),
    }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      config: Arc::clone(&self.config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Cross-origin policy for `frontend_url`: any method, any header,
/// credentials allowed. Requests from any other origin get no
/// `Access-Control-Allow-Origin` header at all.
///
/// Browsers refuse a literal `*` alongside credentials, so the wildcard is
/// served by echoing the request's origin.
pub fn cors_layer(frontend_url: &str) -> Result<CorsLayer, InvalidHeaderValue> {
  let origin = if frontend_url == "*" {
    AllowOrigin::mirror_request()
  } else {
    let allowed = HeaderValue::from_str(frontend_url)?;
    AllowOrigin::predicate(move |origin: &HeaderValue, _| *origin == allowed)
  };
  Ok(
    CorsLayer::new()
      .allow_origin(origin)
      .allow_methods(AllowMethods::mirror_request())
      .allow_headers(AllowHeaders::mirror_request())
      .allow_credentials(true),
  )
}

/// Build the API [`Router`] for `state`.
pub fn router<S>(state: AppState<S>, cors: CorsLayer) -> Router
where
  S: DocumentStore + 'static,
{
  Router::new()
    .route("/", get(diagnostics::root))
    .route("/test", get(diagnostics::test::<S>))
    .route("/contact", post(contact::submit::<S>))
    .route("/projects", get(projects::list::<S>))
    .layer(cors)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
  };
  use folio_core::{Document, Filter, store::DocumentStore};
  use folio_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  fn config() -> ServerConfig {
    ServerConfig {
      backend: Backend::Sqlite,
      database_url: ":memory:".to_owned(),
      ..ServerConfig::default()
    }
  }

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState::new(store, config())
  }

  /// A store whose connection can never be opened.
  fn broken_state() -> AppState<SqliteStore> {
    let path = "/nonexistent-folio-dir/nested/store.db";
    AppState::new(SqliteStore::new(path), ServerConfig {
      database_url: path.to_owned(),
      ..config()
    })
  }

  async fn send(
    state: AppState<SqliteStore>,
    method: Method,
    uri: &str,
    body: Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let app = router(state, cors_layer("*").unwrap());
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn stored_contacts(state: &AppState<SqliteStore>) -> Vec<Document> {
    state.store.read(contact::COLLECTION, Filter::new(), 100).await.unwrap()
  }

  // ── Root ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn root_reports_liveness() {
    let resp = send(make_state().await, Method::GET, "/", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      json_body(resp).await,
      json!({ "message": "Portfolio backend is live" })
    );
  }

  #[tokio::test]
  async fn unknown_route_returns_404() {
    let resp = send(make_state().await, Method::GET, "/nope", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Contact ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn valid_contact_is_received_and_stored() {
    let state = make_state().await;
    let resp = send(
      state.clone(),
      Method::POST,
      "/contact",
      Some(json!({
        "name":    "Ada Lovelace",
        "email":   "ada@example.com",
        "message": "Let's build an engine.",
        "topic":   "collab",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["status"], json!("received"));
    let id = body["id"].as_str().expect("string id");
    assert!(!id.is_empty());

    let stored = stored_contacts(&state).await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["_id"], json!(id));
    assert_eq!(stored[0]["name"], json!("Ada Lovelace"));
    assert_eq!(stored[0]["topic"], json!("collab"));
    assert!(stored[0]["company"].is_null());
    assert!(stored[0]["created_at"].is_string());
  }

  #[tokio::test]
  async fn contact_missing_field_is_rejected_and_not_stored() {
    for missing in ["name", "email", "message"] {
      let state = make_state().await;
      let mut payload = json!({
        "name":    "Ada",
        "email":   "ada@example.com",
        "message": "hello",
      });
      payload.as_object_mut().unwrap().remove(missing);

      let resp = send(state.clone(), Method::POST, "/contact", Some(payload)).await;
      assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
      let body = json_body(resp).await;
      assert_eq!(body["detail"][0]["field"], json!(missing));
      assert!(stored_contacts(&state).await.is_empty());
    }
  }

  #[tokio::test]
  async fn contact_over_length_is_rejected_and_not_stored() {
    let state = make_state().await;
    let resp = send(
      state.clone(),
      Method::POST,
      "/contact",
      Some(json!({
        "name":    "Ada",
        "email":   "e".repeat(contact::EMAIL_MAX + 1),
        "message": "hello",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(resp).await;
    assert_eq!(body["detail"][0]["field"], json!("email"));
    assert!(stored_contacts(&state).await.is_empty());
  }

  #[tokio::test]
  async fn contact_with_malformed_json_is_rejected() {
    let state = make_state().await;
    let req = Request::builder()
      .method(Method::POST)
      .uri("/contact")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from("{\"name\": "))
      .unwrap();
    let resp = router(state, cors_layer("*").unwrap())
      .oneshot(req)
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  }

  #[tokio::test]
  async fn contact_without_json_content_type_keeps_axum_status() {
    let state = make_state().await;
    let req = Request::builder()
      .method(Method::POST)
      .uri("/contact")
      .body(Body::from("name=Ada"))
      .unwrap();
    let resp = router(state, cors_layer("*").unwrap())
      .oneshot(req)
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
  }

  #[tokio::test]
  async fn contact_store_failure_returns_500() {
    let resp = send(
      broken_state(),
      Method::POST,
      "/contact",
      Some(json!({ "name": "Ada", "email": "a@b.c", "message": "hi" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
      json_body(resp).await,
      json!({ "detail": "Failed to store message" })
    );
  }

  // ── Projects ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn empty_projects_return_fallback_in_order() {
    let resp = send(make_state().await, Method::GET, "/projects", None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    let titles: Vec<_> = body
      .as_array()
      .unwrap()
      .iter()
      .map(|p| p["title"].as_str().unwrap())
      .collect();
    assert_eq!(titles, ["MetaBloom", "NEON/GRID", "FOLD"]);
    assert_eq!(body[0]["tags"], json!(["gen-art", "branding", "webgl"]));
    assert_eq!(body[2]["url"], json!("#"));
  }

  #[tokio::test]
  async fn stored_projects_replace_fallback() {
    let state = make_state().await;
    state
      .store
      .create(
        projects::COLLECTION,
        serde_json::from_value(json!({ "title": "Orbit", "year": 2024 })).unwrap(),
      )
      .await
      .unwrap();

    let resp = send(state, Method::GET, "/projects", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], json!("Orbit"));
    assert_eq!(list[0]["year"], json!(2024));
    assert!(list[0]["_id"].is_string());
  }

  #[tokio::test]
  async fn projects_are_capped() {
    let state = make_state().await;
    for i in 0..(projects::LIMIT + 3) {
      state
        .store
        .create(
          projects::COLLECTION,
          serde_json::from_value(json!({ "title": format!("P{i}") })).unwrap(),
        )
        .await
        .unwrap();
    }

    let resp = send(state, Method::GET, "/projects", None).await;
    let body = json_body(resp).await;
    assert_eq!(body.as_array().unwrap().len(), projects::LIMIT);
  }

  #[tokio::test]
  async fn projects_store_failure_returns_500() {
    let resp = send(broken_state(), Method::GET, "/projects", None).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  // ── Diagnostics ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn test_endpoint_lists_collections() {
    let state = make_state().await;
    send(
      state.clone(),
      Method::POST,
      "/contact",
      Some(json!({ "name": "Ada", "email": "a@b.c", "message": "hi" })),
    )
    .await;

    let resp = send(state, Method::GET, "/test", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["backend"], json!("ok"));
    assert_eq!(body["database"], json!("connected"));
    assert_eq!(body["connection_status"], json!("ok"));
    assert_eq!(body["database_name"], json!("appdb"));
    assert_eq!(body["collections"], json!(["contact"]));
  }

  #[tokio::test]
  async fn test_endpoint_survives_unreachable_store() {
    let resp = send(broken_state(), Method::GET, "/test", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["backend"], json!("ok"));
    assert_eq!(body["database"], json!("unavailable"));
    assert_eq!(body["collections"], json!([]));
  }

  // ── CORS ──────────────────────────────────────────────────────────────────

  fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
      .method(Method::OPTIONS)
      .uri("/contact")
      .header(header::ORIGIN, origin)
      .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
      .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
      .body(Body::empty())
      .unwrap()
  }

  #[tokio::test]
  async fn wildcard_origin_is_echoed_with_credentials() {
    let app = router(make_state().await, cors_layer("*").unwrap());
    let resp = app.oneshot(preflight("https://anywhere.dev")).await.unwrap();

    let headers = resp.headers();
    assert_eq!(
      headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
      "https://anywhere.dev"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
  }

  #[tokio::test]
  async fn configured_origin_is_enforced() {
    let cors = cors_layer("https://portfolio.example").unwrap();

    let app = router(make_state().await, cors.clone());
    let resp = app.oneshot(preflight("https://portfolio.example")).await.unwrap();
    assert_eq!(
      resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
      "https://portfolio.example"
    );

    let app = router(make_state().await, cors);
    let resp = app.oneshot(preflight("https://evil.example")).await.unwrap();
    assert!(!resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
  }

  #[test]
  fn invalid_origin_is_a_config_error() {
    assert!(cors_layer("https://bad\norigin").is_err());
  }

  #[test]
  fn sqlite_backend_rejects_mongo_url() {
    let cfg = ServerConfig {
      backend: Backend::Sqlite,
      ..ServerConfig::default()
    };
    assert!(matches!(cfg.check(), Err(ConfigError::SqliteNeedsPath(_))));

    assert!(config().check().is_ok());
    assert!(ServerConfig::default().check().is_ok());
  }

  #[test]
  fn config_defaults_match_documented_values() {
    let cfg = ServerConfig::default();
    assert_eq!(cfg.database_url, "mongodb://localhost:27017");
    assert_eq!(cfg.database_name, "appdb");
    assert_eq!(cfg.frontend_url, "*");
    assert_eq!(cfg.backend, Backend::Mongo);
  }
}
