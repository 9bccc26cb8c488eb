use crate::{
    db::{
        cursor::{Cursor, ReverseCursor},
        index::BoundIndex,
        table::Table,
    },
    error::InternalError,
    host::KvHost,
    key::{Key, ToKey},
    name::Name,
    obs::sink::{self, MetricsEvent},
    serialize::Record,
};
use std::{borrow::Borrow, cmp::Ordering, fmt, marker::PhantomData, panic::Location};

///
/// IndexView
///
/// Read access to one bound index of a table, typed by the index key `K`.
/// Lookups accept any borrowed form of `K` (`&str` for `String` keys).
/// Untyped views use `K = Key` and take pre-encoded field keys.
///

pub struct IndexView<'t, R, H: KvHost, K> {
    table: &'t Table<R, H>,
    index: &'t BoundIndex<R>,
    _key: PhantomData<fn(&K)>,
}

impl<'t, R: Record, H: KvHost, K> IndexView<'t, R, H, K> {
    pub(crate) const fn new(table: &'t Table<R, H>, index: &'t BoundIndex<R>) -> Self {
        Self {
            table,
            index,
            _key: PhantomData,
        }
    }

    #[must_use]
    pub const fn name(&self) -> Name {
        self.index.name()
    }

    /// Namespace prefix shared by every entry of this index.
    #[must_use]
    pub const fn prefix(&self) -> &'t Key {
        self.index.prefix()
    }

    #[must_use]
    pub const fn is_primary(&self) -> bool {
        self.index.is_primary()
    }

    /// Cursor at `key`, or the end cursor when no entry matches exactly.
    pub fn find<Q>(&self, key: &Q) -> Result<Cursor<'t, R, H>, InternalError>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let key = self.storage_key(key)?;
        let cursor = Cursor::lower_bound(self.table, self.index, &key);
        let hit = cursor.key_compare(&key) == Ordering::Equal;
        self.record_lookup(hit);

        if hit { Ok(cursor) } else { Ok(self.end()) }
    }

    /// Point lookup without positioning a cursor.
    pub fn exists<Q>(&self, key: &Q) -> Result<bool, InternalError>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let key = self.storage_key(key)?;
        let hit = self
            .table
            .host()
            .kv_get(self.table.namespace(), &key)
            .is_some();
        self.record_lookup(hit);

        Ok(hit)
    }

    /// Record stored under `key`, if any.
    pub fn get<Q>(&self, key: &Q) -> Result<Option<R>, InternalError>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let key = self.storage_key(key)?;

        self.get_stored(&key)
    }

    /// Record stored under `key`; a missing key is an error naming the caller.
    #[track_caller]
    pub fn at<Q>(&self, key: &Q) -> Result<R, InternalError>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let at = Location::caller();
        let field = Key::encode(key)?;

        self.get_stored(&self.index.table_key(&field))?
            .ok_or_else(|| {
                InternalError::index_not_found(&self.name().to_string(), &field.to_hex(), at)
            })
    }

    /// Cursor at the lowest key.
    #[must_use]
    pub fn begin(&self) -> Cursor<'t, R, H> {
        Cursor::lower_bound(self.table, self.index, &[])
    }

    /// Past-the-end sentinel.
    #[must_use]
    pub const fn end(&self) -> Cursor<'t, R, H> {
        Cursor::end(self.table, self.index)
    }

    /// Reverse cursor at the highest key.
    #[must_use]
    pub fn rbegin(&self) -> ReverseCursor<'t, R, H> {
        ReverseCursor::rbegin(self.table, self.index)
    }

    /// Before-the-beginning sentinel.
    #[must_use]
    pub const fn rend(&self) -> ReverseCursor<'t, R, H> {
        ReverseCursor::rend(self.table, self.index)
    }

    /// First entry with a key ≥ `key`.
    pub fn lower_bound<Q>(&self, key: &Q) -> Result<Cursor<'t, R, H>, InternalError>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let key = self.storage_key(key)?;

        Ok(Cursor::lower_bound(self.table, self.index, &key))
    }

    /// First entry with a key > `key`.
    pub fn upper_bound<Q>(&self, key: &Q) -> Result<Cursor<'t, R, H>, InternalError>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let key = self.storage_key(key)?;
        let mut cursor = Cursor::lower_bound(self.table, self.index, &key);
        if cursor.key_compare(&key) == Ordering::Equal {
            cursor.advance()?;
        }

        Ok(cursor)
    }

    /// Every record with a key in `[begin, end)`, ascending.
    pub fn range<Q>(&self, begin: &Q, end: &Q) -> Result<Vec<R>, InternalError>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let mut cursor = self.lower_bound(begin)?;
        let stop = self.lower_bound(end)?;

        let mut rows = Vec::new();
        while cursor < stop {
            rows.push(cursor.value()?);
            cursor.advance()?;
        }

        sink::record(MetricsEvent::RangeRows {
            table: self.table.name(),
            rows: u64::try_from(rows.len()).unwrap_or(u64::MAX),
        });

        Ok(rows)
    }

    /// Every record in ascending key order.
    #[must_use]
    pub fn iter(&self) -> Cursor<'t, R, H> {
        self.begin()
    }

    fn storage_key<Q>(&self, key: &Q) -> Result<Key, InternalError>
    where
        Q: ToKey + ?Sized,
    {
        let field = Key::encode(key)?;

        Ok(self.index.table_key(&field))
    }

    // Secondary entries hold the primary storage key; resolve through it.
    fn get_stored(&self, key: &Key) -> Result<Option<R>, InternalError> {
        let Some(bytes) = self.table.read(key)? else {
            self.record_lookup(false);
            return Ok(None);
        };
        self.record_lookup(true);

        if self.is_primary() {
            return self.table.decode(&bytes).map(Some);
        }

        match self.table.read(&bytes)? {
            Some(record) => self.table.decode(&record).map(Some),
            None => Err(InternalError::host_corruption(format!(
                "failure getting primary key: {} -> {}",
                self.name(),
                Key::from(bytes).to_hex(),
            ))),
        }
    }

    fn record_lookup(&self, hit: bool) {
        sink::record(MetricsEvent::Lookup {
            table: self.table.name(),
            hit,
        });
    }
}

impl<'t, R: Record, H: KvHost, K> IntoIterator for &IndexView<'t, R, H, K> {
    type Item = Result<R, InternalError>;
    type IntoIter = Cursor<'t, R, H>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<R, H: KvHost, K> Clone for IndexView<'_, R, H, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, H: KvHost, K> Copy for IndexView<'_, R, H, K> {}

impl<R, H: KvHost, K> fmt::Debug for IndexView<'_, R, H, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexView")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
