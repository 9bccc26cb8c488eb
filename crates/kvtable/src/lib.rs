//! ## Crate layout
//! - `core`: the table engine: keys, names, host store, tables, indices,
//!   cursors, serialization, configuration and observability.
//!
//! The `prelude` module carries everything needed to declare a record,
//! its indices and a table over a host store.

pub use kvtable_core as core;

/// re-exports
///
/// records must be serde types; derive them with
/// `#[serde(crate = "kvtable::__reexports::serde")]` to avoid naming serde
/// in the caller's Cargo.toml
pub mod __reexports {
    pub use serde;
}

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Macros
//

pub use core::{error::InternalError as Error, kv_index};

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        config::TableConfig,
        db::{Cursor, Index, IndexView, ReverseCursor, Table},
        host::{KvHost as _, MemoryHost, Namespace},
        key::{FromKey as _, Key, ToKey as _},
        kv_index,
        name::{KV_DISK, KV_RAM, Name},
        obs::{metrics_report, metrics_reset},
        serialize::{Record, RecordEnvelope},
    };
    pub use serde::{Deserialize, Serialize};
}
