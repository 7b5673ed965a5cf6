//! Error type for `folio-store-mongo`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("mongodb error: {0}")]
  Driver(#[from] mongodb::error::Error),

  #[error("bson encoding error: {0}")]
  Encode(#[from] mongodb::bson::ser::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
