//! MongoDB backend for the Folio document store.
//!
//! The driver client is created lazily on first use and shared for the
//! lifetime of the process. Documents cross the crate boundary as plain JSON:
//! ObjectIds become hex strings and BSON datetimes become RFC 3339 strings.

mod convert;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::MongoStore;
