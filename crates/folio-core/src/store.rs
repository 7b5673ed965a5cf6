//! The `DocumentStore` trait: a generic gateway over a schemaless store.
//!
//! The trait is implemented by storage backends (`folio-store-mongo`,
//! `folio-store-sqlite`). The API layer depends on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use crate::document::{Document, Filter};

/// Number of documents [`DocumentStore::read`] callers ask for when they have
/// no better limit in mind.
pub const DEFAULT_READ_LIMIT: usize = 50;

/// Abstraction over a collection-oriented document store.
///
/// Collections are created implicitly on first write. Every operation calls
/// [`initialize`](Self::initialize) itself, so callers never need to.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Establish the connection handle, or return immediately if an earlier
  /// call already did.
  ///
  /// Safe to call repeatedly and concurrently: only the first caller performs
  /// setup and every caller observes the same handle. A failed attempt is not
  /// remembered, so the next call tries again.
  fn initialize(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Insert `data` into `collection`, stamped with `created_at` and
  /// `updated_at`. Returns the stored document including its string `_id`.
  fn create<'a>(
    &'a self,
    collection: &'a str,
    data: Document,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + 'a;

  /// Return up to `limit` documents from `collection` matching `filter`.
  ///
  /// Ordering is whatever the backend's natural order yields; callers must
  /// not depend on it.
  fn read<'a>(
    &'a self,
    collection: &'a str,
    filter: Filter,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + 'a;

  /// Merge `update` into every document in `collection` matching `filter`,
  /// refreshing `updated_at`. Returns the number of documents modified.
  fn update<'a>(
    &'a self,
    collection: &'a str,
    filter: Filter,
    update: Document,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Remove every document in `collection` matching `filter`. Returns the
  /// number removed.
  fn delete<'a>(
    &'a self,
    collection: &'a str,
    filter: Filter,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Names of the collections that currently hold documents.
  fn list_collections(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;
}
