//! Core engine for kvtable: typed multi-index tables layered over a
//! primitive ordered key-value host store, with order-preserving keys,
//! scoped host iterators and structured errors.

#[macro_use]
mod macros;

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod host;
pub mod key;
pub mod name;
pub mod obs;
pub mod serialize;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///
/// Table vocabulary only; hosts other than the in-memory one, errors and
/// serializers stay one module level down.
///

pub mod prelude {
    pub use crate::{
        config::TableConfig,
        db::{Cursor, Index, IndexView, ReverseCursor, Table},
        host::{KvHost, MemoryHost, Namespace},
        key::{FromKey, Key, ToKey},
        kv_index,
        name::{KV_DISK, KV_RAM, Name},
        serialize::{Record, RecordEnvelope},
    };
}
