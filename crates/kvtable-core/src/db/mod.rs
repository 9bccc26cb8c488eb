//! Module: db
//! Responsibility: typed tables, their indices and cursors over a host store.

pub mod cursor;
pub mod index;
pub mod table;

#[cfg(test)]
mod tests;

// re-exports
pub use cursor::{Cursor, ReverseCursor};
pub use index::{Index, IndexView};
pub use table::{Table, TableBuilder};
