//! Schemaless documents and the metadata the store stamps onto them.
//!
//! A [`Document`] is an insertion-ordered JSON object. The store owns three
//! reserved keys: [`ID_FIELD`], [`CREATED_AT`] and [`UPDATED_AT`]. Callers may
//! put anything else in a document; nothing below the API boundary inspects
//! its shape.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Error, Result};

/// A schemaless record: string keys mapped to arbitrary JSON values.
pub type Document = Map<String, Value>;

/// Equality predicates over top-level document fields. Empty matches all.
pub type Filter = Map<String, Value>;

/// Store-assigned unique identifier, always a string at the trait boundary.
pub const ID_FIELD: &str = "_id";
/// Set once on insert; never changed afterwards.
pub const CREATED_AT: &str = "created_at";
/// Set on insert and refreshed by every update.
pub const UPDATED_AT: &str = "updated_at";

/// Render a timestamp the way every backend exposes it: RFC 3339, UTC,
/// millisecond precision, `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
  at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Prepare caller data for insertion.
///
/// Any caller-supplied `_id`, `created_at` or `updated_at` is discarded and
/// both timestamps are set to `now`.
pub fn stamp_created(mut data: Document, now: DateTime<Utc>) -> Document {
  data.remove(ID_FIELD);
  let at = Value::String(format_timestamp(now));
  data.insert(CREATED_AT.to_owned(), at.clone());
  data.insert(UPDATED_AT.to_owned(), at);
  data
}

/// Prepare a field-merge update.
///
/// `_id` and `created_at` are immutable and are dropped from the payload;
/// `updated_at` is set to `now`.
pub fn stamp_updated(mut update: Document, now: DateTime<Utc>) -> Document {
  update.remove(ID_FIELD);
  update.remove(CREATED_AT);
  update.insert(
    UPDATED_AT.to_owned(),
    Value::String(format_timestamp(now)),
  );
  update
}

/// Serialize any `Serialize` value into a [`Document`].
///
/// Fails if the value does not serialize to a JSON object.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document> {
  match serde_json::to_value(value)? {
    Value::Object(map) => Ok(map),
    other => Err(Error::NotAnObject(kind_name(&other))),
  }
}

/// Return the identifier of a stored document, if it carries one.
pub fn document_id(doc: &Document) -> Option<&str> {
  doc.get(ID_FIELD).and_then(Value::as_str)
}

/// Whether `doc` satisfies every equality predicate in `filter`.
///
/// Used by backends that cannot push filters down to the database.
pub fn matches(doc: &Document, filter: &Filter) -> bool {
  filter
    .iter()
    .all(|(key, expected)| doc.get(key) == Some(expected))
}

fn kind_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}
