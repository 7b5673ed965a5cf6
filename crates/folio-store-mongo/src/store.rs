//! [`MongoStore`] — the MongoDB implementation of [`DocumentStore`].

use chrono::Utc;
use futures_util::TryStreamExt as _;
use mongodb::{
  Client, Database,
  bson::{self, doc},
};
use serde_json::Value;
use tokio::sync::OnceCell;

use folio_core::{
  Document, Filter,
  document::{ID_FIELD, stamp_created, stamp_updated},
  store::DocumentStore,
};

use crate::{
  Result,
  convert::{filter_to_bson, id_to_string, to_bson, to_json},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Folio document store backed by a MongoDB database.
///
/// Constructing the store does no I/O. The driver client is built and the
/// server pinged on the first operation; the handle is reused by every later
/// one.
pub struct MongoStore {
  url:           String,
  database_name: String,
  db:            OnceCell<Database>,
}

impl MongoStore {
  pub fn new(url: impl Into<String>, database_name: impl Into<String>) -> Self {
    Self {
      url:           url.into(),
      database_name: database_name.into(),
      db:            OnceCell::new(),
    }
  }

  pub fn database_name(&self) -> &str { &self.database_name }

  /// Whether the client has been created.
  pub fn is_initialized(&self) -> bool { self.db.initialized() }

  /// The shared database handle, created on first call.
  pub(crate) async fn database(&self) -> Result<&Database> {
    self
      .db
      .get_or_try_init(|| async {
        let client = Client::with_uri_str(&self.url).await?;
        let db = client.database(&self.database_name);
        // The driver connects lazily; ping so an unreachable server fails here.
        db.run_command(doc! { "ping": 1 }).await?;
        tracing::info!(database = %self.database_name, "connected to mongodb");
        Ok::<_, crate::Error>(db)
      })
      .await
  }

  fn collection(db: &Database, name: &str) -> mongodb::Collection<bson::Document> {
    db.collection::<bson::Document>(name)
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for MongoStore {
  type Error = crate::Error;

  async fn initialize(&self) -> Result<()> {
    self.database().await?;
    Ok(())
  }

  async fn create(&self, collection: &str, data: Document) -> Result<Document> {
    let db = self.database().await?;

    let mut doc = stamp_created(data, Utc::now());
    let result = Self::collection(db, collection)
      .insert_one(to_bson(&doc)?)
      .await?;

    doc.insert(
      ID_FIELD.to_owned(),
      Value::String(id_to_string(result.inserted_id)),
    );
    Ok(doc)
  }

  async fn read(
    &self,
    collection: &str,
    filter: Filter,
    limit: usize,
  ) -> Result<Vec<Document>> {
    // The driver treats a limit of zero as "no limit".
    if limit == 0 {
      return Ok(Vec::new());
    }
    let db = self.database().await?;

    let cursor = Self::collection(db, collection)
      .find(filter_to_bson(&filter)?)
      .limit(i64::try_from(limit).unwrap_or(i64::MAX))
      .await?;
    let stored: Vec<bson::Document> = cursor.try_collect().await?;

    Ok(stored.into_iter().map(to_json).collect())
  }

  async fn update(
    &self,
    collection: &str,
    filter: Filter,
    update: Document,
  ) -> Result<u64> {
    let db = self.database().await?;

    let set = to_bson(&stamp_updated(update, Utc::now()))?;
    let result = Self::collection(db, collection)
      .update_many(filter_to_bson(&filter)?, doc! { "$set": set })
      .await?;
    Ok(result.modified_count)
  }

  async fn delete(&self, collection: &str, filter: Filter) -> Result<u64> {
    let db = self.database().await?;

    let result = Self::collection(db, collection)
      .delete_many(filter_to_bson(&filter)?)
      .await?;
    Ok(result.deleted_count)
  }

  async fn list_collections(&self) -> Result<Vec<String>> {
    let db = self.database().await?;
    Ok(db.list_collection_names().await?)
  }
}
