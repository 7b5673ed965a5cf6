//! [`SqliteStore`] — the SQLite implementation of [`DocumentStore`].

use std::path::PathBuf;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::OnceCell;
use uuid::Uuid;

use folio_core::{
  Document, Filter,
  document::{ID_FIELD, matches, stamp_created, stamp_updated},
  store::DocumentStore,
};

use crate::{Result, schema::SCHEMA};

/// Path understood as "no file, keep everything in memory".
const IN_MEMORY: &str = ":memory:";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Folio document store backed by a single SQLite file.
///
/// The connection is opened lazily on first use and kept for the lifetime of
/// the store.
pub struct SqliteStore {
  path: Option<PathBuf>,
  conn: OnceCell<tokio_rusqlite::Connection>,
}

impl SqliteStore {
  /// Describe a store at `path` without touching the filesystem yet.
  /// The literal path `:memory:` selects an in-memory database.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    let path = (path.as_os_str() != IN_MEMORY).then_some(path);
    Self {
      path,
      conn: OnceCell::new(),
    }
  }

  /// An in-memory store — useful for testing.
  pub fn in_memory() -> Self {
    Self {
      path: None,
      conn: OnceCell::new(),
    }
  }

  /// Open an in-memory store with its schema already in place.
  pub async fn open_in_memory() -> Result<Self> {
    let store = Self::in_memory();
    store.connection().await?;
    Ok(store)
  }

  /// Whether the connection has been established.
  pub fn is_initialized(&self) -> bool { self.conn.initialized() }

  /// The shared connection, opened on first call.
  pub(crate) async fn connection(&self) -> Result<&tokio_rusqlite::Connection> {
    self
      .conn
      .get_or_try_init(|| async {
        let conn = match &self.path {
          Some(path) => tokio_rusqlite::Connection::open(path).await?,
          None => tokio_rusqlite::Connection::open_in_memory().await?,
        };
        conn
          .call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
          })
          .await?;
        tracing::info!(path = ?self.path, "opened sqlite document store");
        Ok::<_, crate::Error>(conn)
      })
      .await
  }
}

/// Rebuild a stored row into a document with `_id` first.
/// Returns `None` for bodies that are not JSON objects.
fn with_id(id: String, body: Value) -> Option<Document> {
  let Value::Object(fields) = body else {
    return None;
  };
  let mut doc = Document::new();
  doc.insert(ID_FIELD.to_owned(), Value::String(id));
  doc.extend(fields);
  Some(doc)
}

/// Rows of `collection` in natural order, as `(seq, doc_id, body)`.
fn select_collection(
  conn: &rusqlite::Connection,
  collection: &str,
) -> rusqlite::Result<Vec<(i64, String, Value)>> {
  let mut stmt = conn.prepare(
    "SELECT seq, doc_id, body FROM documents WHERE collection = ?1 ORDER BY seq",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![collection], |row| {
      Ok((row.get(0)?, row.get(1)?, row.get(2)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = crate::Error;

  async fn initialize(&self) -> Result<()> {
    self.connection().await?;
    Ok(())
  }

  async fn create(&self, collection: &str, data: Document) -> Result<Document> {
    let conn = self.connection().await?;

    let mut doc = stamp_created(data, Utc::now());
    let id = Uuid::new_v4().hyphenated().to_string();

    let collection = collection.to_owned();
    let id_str = id.clone();
    let body = Value::Object(doc.clone());

    conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (collection, doc_id, body) VALUES (?1, ?2, ?3)",
          rusqlite::params![collection, id_str, body],
        )?;
        Ok(())
      })
      .await?;

    doc.insert(ID_FIELD.to_owned(), Value::String(id));
    Ok(doc)
  }

  async fn read(
    &self,
    collection: &str,
    filter: Filter,
    limit: usize,
  ) -> Result<Vec<Document>> {
    let conn = self.connection().await?;
    let collection = collection.to_owned();

    let docs = conn
      .call(move |conn| {
        let docs: Vec<Document> = select_collection(conn, &collection)?
          .into_iter()
          .filter_map(|(_, id, body)| with_id(id, body))
          .filter(|doc| matches(doc, &filter))
          .take(limit)
          .collect();
        Ok(docs)
      })
      .await?;

    Ok(docs)
  }

  async fn update(
    &self,
    collection: &str,
    filter: Filter,
    update: Document,
  ) -> Result<u64> {
    let conn = self.connection().await?;
    let update = stamp_updated(update, Utc::now());
    let collection = collection.to_owned();

    let modified = conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut modified: u64 = 0;
        for (seq, id, body) in select_collection(&tx, &collection)? {
          let Some(mut doc) = with_id(id, body) else { continue };
          if !matches(&doc, &filter) {
            continue;
          }
          doc.remove(ID_FIELD);
          doc.extend(update.clone());
          tx.execute(
            "UPDATE documents SET body = ?1 WHERE seq = ?2",
            rusqlite::params![Value::Object(doc), seq],
          )?;
          modified += 1;
        }
        tx.commit()?;
        Ok(modified)
      })
      .await?;

    Ok(modified)
  }

  async fn delete(&self, collection: &str, filter: Filter) -> Result<u64> {
    let conn = self.connection().await?;
    let collection = collection.to_owned();

    let deleted = conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut deleted: u64 = 0;
        for (seq, id, body) in select_collection(&tx, &collection)? {
          if with_id(id, body).is_some_and(|doc| matches(&doc, &filter)) {
            tx.execute(
              "DELETE FROM documents WHERE seq = ?1",
              rusqlite::params![seq],
            )?;
            deleted += 1;
          }
        }
        tx.commit()?;
        Ok(deleted)
      })
      .await?;

    Ok(deleted)
  }

  async fn list_collections(&self) -> Result<Vec<String>> {
    let conn = self.connection().await?;

    let names = conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT collection FROM documents ORDER BY collection",
        )?;
        let names = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
      })
      .await?;

    Ok(names)
  }
}
