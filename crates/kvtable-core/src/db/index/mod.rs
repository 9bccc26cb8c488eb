mod view;

pub use view::IndexView;

use crate::{
    error::InternalError,
    key::{Key, KeyEncodeError, ToKey, make_prefix},
    name::Name,
};
use std::{any::TypeId, fmt};

///
/// Index
///
/// Definition of one index over records of type `R`: a name unique within
/// its table plus a pure function deriving the index key from a record.
/// Definitions are plain values; a table binds them once at build time.
///

pub struct Index<R, K> {
    name: Name,
    extract: fn(&R) -> K,
}

impl<R, K> Index<R, K> {
    #[must_use]
    pub const fn new(name: Name, extract: fn(&R) -> K) -> Self {
        Self { name, extract }
    }

    #[must_use]
    pub const fn name(&self) -> Name {
        self.name
    }

    /// Derive this index's key from a record.
    pub fn key_of(&self, record: &R) -> K {
        (self.extract)(record)
    }
}

impl<R, K> Clone for Index<R, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, K> Copy for Index<R, K> {}

impl<R, K> fmt::Debug for Index<R, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index").field("name", &self.name).finish()
    }
}

///
/// BoundIndex
///
/// An index definition after table setup: prefix computed, key type erased
/// behind an encoder, identity recorded for typed view checks.
///

pub(crate) struct BoundIndex<R> {
    name: Name,
    prefix: Key,
    key_type: TypeId,
    primary: bool,
    encode: Box<dyn Fn(&R) -> Result<Key, KeyEncodeError>>,
}

impl<R: 'static> BoundIndex<R> {
    pub(crate) fn bind<K>(table: Name, def: Index<R, K>, primary: bool) -> Self
    where
        K: ToKey + 'static,
    {
        Self {
            name: def.name,
            prefix: make_prefix(table, def.name),
            key_type: TypeId::of::<K>(),
            primary,
            encode: Box::new(move |record: &R| Key::encode(&def.key_of(record))),
        }
    }
}

impl<R> BoundIndex<R> {
    pub(crate) const fn name(&self) -> Name {
        self.name
    }

    pub(crate) const fn prefix(&self) -> &Key {
        &self.prefix
    }

    pub(crate) const fn is_primary(&self) -> bool {
        self.primary
    }

    pub(crate) fn has_key_type(&self, key_type: TypeId) -> bool {
        self.key_type == key_type
    }

    /// Fully-qualified storage key for `field_key` under this index.
    pub(crate) fn table_key(&self, field_key: &Key) -> Key {
        &self.prefix + field_key
    }

    /// Fully-qualified storage key of `record` under this index.
    pub(crate) fn record_key(&self, record: &R) -> Result<Key, InternalError> {
        let field_key = (self.encode)(record)?;

        Ok(self.table_key(&field_key))
    }
}

impl<R> fmt::Debug for BoundIndex<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundIndex")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("primary", &self.primary)
            .finish_non_exhaustive()
    }
}
