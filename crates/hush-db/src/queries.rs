//! Database query functions organized by domain.

pub mod responses;
pub mod surveys;
pub mod used_tokens;

use hush_types::id::ID_SIZE;

use crate::{DbError, Result};

/// Decode an id column.
pub(crate) fn id_bytes(raw: Vec<u8>) -> Result<[u8; ID_SIZE]> {
    let len = raw.len();
    raw.try_into()
        .map_err(|_| DbError::Corrupt(format!("id column has {len} bytes, expected {ID_SIZE}")))
}
