//! Conversions between BSON documents and the JSON [`Document`] model.

use chrono::{DateTime, Utc};
use folio_core::{
  Document, Filter,
  document::{CREATED_AT, ID_FIELD, UPDATED_AT, format_timestamp},
};
use mongodb::bson::{self, Bson, oid::ObjectId};
use serde_json::Value;

use crate::Result;

// ─── JSON → BSON ──────────────────────────────────────────────────────────────

/// Encode a JSON document for storage, turning the metadata timestamps into
/// native BSON datetimes so the database can index and sort them.
pub fn to_bson(doc: &Document) -> Result<bson::Document> {
  let mut out = bson::to_document(doc)?;
  timestamps_to_datetimes(doc, &mut out);
  Ok(out)
}

/// Encode a filter. Timestamp strings are matched as the datetimes they were
/// stored as, and a string `_id` that parses as an ObjectId is matched as
/// one, so values handed out by
/// [`create`](folio_core::store::DocumentStore::create) find the document
/// again.
pub fn filter_to_bson(filter: &Filter) -> Result<bson::Document> {
  let mut out = bson::to_document(filter)?;
  timestamps_to_datetimes(filter, &mut out);
  let oid = match out.get(ID_FIELD) {
    Some(Bson::String(id)) => ObjectId::parse_str(id).ok(),
    _ => None,
  };
  if let Some(oid) = oid {
    out.insert(ID_FIELD, oid);
  }
  Ok(out)
}

/// Replace RFC 3339 `created_at`/`updated_at` strings with BSON datetimes.
fn timestamps_to_datetimes(json: &Document, out: &mut bson::Document) {
  for key in [CREATED_AT, UPDATED_AT] {
    if let Some(at) = json
      .get(key)
      .and_then(Value::as_str)
      .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    {
      out.insert(
        key,
        Bson::DateTime(bson::DateTime::from_millis(at.timestamp_millis())),
      );
    }
  }
}

// ─── BSON → JSON ──────────────────────────────────────────────────────────────

/// Decode a stored document, normalising `_id` to a string.
pub fn to_json(doc: bson::Document) -> Document {
  doc
    .into_iter()
    .map(|(key, value)| {
      let value = if key == ID_FIELD {
        Value::String(id_to_string(value))
      } else {
        bson_to_json(value)
      };
      (key, value)
    })
    .collect()
}

/// Render any identifier as the opaque string callers see.
pub fn id_to_string(id: Bson) -> String {
  match id {
    Bson::ObjectId(oid) => oid.to_hex(),
    Bson::String(s) => s,
    other => other.into_relaxed_extjson().to_string(),
  }
}

fn bson_to_json(value: Bson) -> Value {
  match value {
    Bson::ObjectId(oid) => Value::String(oid.to_hex()),
    Bson::DateTime(dt) => {
      match DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis()) {
        Some(at) => Value::String(format_timestamp(at)),
        None => Bson::DateTime(dt).into_relaxed_extjson(),
      }
    }
    Bson::Document(doc) => Value::Object(to_json(doc)),
    Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
    other => other.into_relaxed_extjson(),
  }
}
