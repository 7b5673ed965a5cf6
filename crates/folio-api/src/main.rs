//! folio-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), layers the
//! environment on top (`DATABASE_URL`, `DATABASE_NAME`, `FRONTEND_URL`, ...),
//! and serves the portfolio API over HTTP.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use folio_api::{AppState, Backend, ServerConfig};
use folio_core::store::DocumentStore;
use folio_store_mongo::MongoStore;
use folio_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Folio portfolio API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::default())
    .build()
    .context("failed to read configuration")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  server_cfg.check().context("invalid configuration")?;

  match server_cfg.backend {
    Backend::Mongo => {
      let store =
        MongoStore::new(&server_cfg.database_url, &server_cfg.database_name);
      serve(store, server_cfg).await
    }
    Backend::Sqlite => {
      let store = SqliteStore::new(&server_cfg.database_url);
      serve(store, server_cfg).await
    }
  }
}

async fn serve<S>(store: S, server_cfg: ServerConfig) -> anyhow::Result<()>
where
  S: DocumentStore + 'static,
{
  // Not fatal: every store operation retries initialization.
  match store.initialize().await {
    Ok(()) => tracing::info!(backend = ?server_cfg.backend, "store initialized"),
    Err(e) => tracing::warn!(error = %e, "store initialization failed"),
  }

  let cors = folio_api::cors_layer(&server_cfg.frontend_url)
    .with_context(|| format!("invalid FRONTEND_URL {:?}", server_cfg.frontend_url))?;
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let app = folio_api::router(AppState::new(store, server_cfg), cors);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("server shut down");
  Ok(())
}

/// Resolve on Ctrl+C or, on unix, SIGTERM.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::error!(error = %e, "failed to listen for Ctrl+C");
      std::future::pending::<()>().await;
    }
    tracing::info!("received Ctrl+C, shutting down");
  };

  #[cfg(unix)]
  let terminate = async {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
        tracing::info!("received terminate signal, shutting down");
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to install SIGTERM handler");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
}
