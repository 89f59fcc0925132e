//! Object identity for ngit: the `ObjectId` type, hex codec, and the
//! streaming SHA-1 hasher used for content addressing.

mod error;
pub mod hasher;
pub mod hex;
mod oid;

pub use error::HashError;
pub use oid::{is_hex_oid, ObjectId};
