//! Module: db::cursor
//! Responsibility: ordered positions within one index's prefix range.
//! Does not own: key construction or index maintenance.
//! Boundary: every cursor owns at most one host iterator handle, released
//! when the cursor is dropped or overwritten.


use crate::{
    db::{index::BoundIndex, table::Table},
    error::InternalError,
    host::{IteratorHandle, IteratorStatus, KvHost},
    key::{FromKey, Key, KeyReader},
    obs::sink::{self, MetricsEvent},
    serialize::Record,
};
use std::{cmp::Ordering, fmt};

///
/// CursorBase
///
/// State shared by both traversal directions. A cursor with no handle is an
/// unpositioned sentinel (`end` or `rend`); it creates its handle lazily on
/// the first retreat.
///

struct CursorBase<'t, R, H: KvHost> {
    table: &'t Table<R, H>,
    index: &'t BoundIndex<R>,
    handle: Option<IteratorHandle<'t, H>>,
    status: IteratorStatus,
}

impl<'t, R: Record, H: KvHost> CursorBase<'t, R, H> {
    const fn sentinel(table: &'t Table<R, H>, index: &'t BoundIndex<R>) -> Self {
        Self {
            table,
            index,
            handle: None,
            status: IteratorStatus::End,
        }
    }

    fn open(table: &'t Table<R, H>, index: &'t BoundIndex<R>) -> Self {
        let handle = IteratorHandle::create(table.host(), table.namespace(), index.prefix());
        sink::record(MetricsEvent::CursorOpened {
            table: table.name(),
        });

        Self {
            table,
            index,
            handle: Some(handle),
            status: IteratorStatus::End,
        }
    }

    fn handle(&mut self) -> &IteratorHandle<'t, H> {
        let (table, index) = (self.table, self.index);

        self.handle.get_or_insert_with(|| {
            sink::record(MetricsEvent::CursorOpened {
                table: table.name(),
            });
            IteratorHandle::create(table.host(), table.namespace(), index.prefix())
        })
    }

    fn is_end(&self) -> bool {
        self.handle.is_none() || self.status.is_end()
    }

    // Live: a pair erased after positioning reports `Erased`.
    fn status(&self) -> IteratorStatus {
        match &self.handle {
            Some(handle) if !self.status.is_end() => handle.status(),
            _ => IteratorStatus::End,
        }
    }

    fn step(&mut self, forward: bool) {
        let handle = self.handle();
        let status = if forward { handle.next() } else { handle.prev() };
        self.status = status;
    }

    // Step toward `forward`; stepping off the edge moves back onto the edge
    // key so a failed retreat leaves the position as it was.
    fn retreat(&mut self, forward: bool) -> Result<(), InternalError> {
        let was_end = self.is_end();
        self.step(forward);
        if !self.status.is_end() {
            return Ok(());
        }

        if !was_end {
            self.step(!forward);
        }

        Err(InternalError::cursor_misuse("decremented past the beginning"))
    }

    fn lower_bound(&mut self, key: &[u8]) {
        self.status = self.handle().lower_bound(key);
    }

    fn value(&self) -> Result<R, InternalError> {
        let Some(handle) = self.handle.as_ref().filter(|_| !self.status.is_end()) else {
            return Err(InternalError::cursor_misuse("Cannot read end iterator"));
        };

        let (status, bytes) = handle.value();
        if status != IteratorStatus::Ok {
            return Err(InternalError::cursor_misuse(
                "Error reading value: the pair at this position was erased",
            ));
        }

        if self.index.is_primary() {
            return self.table.decode(&bytes);
        }

        match self.table.read(&bytes)? {
            Some(record) => self.table.decode(&record),
            None => Err(InternalError::host_corruption(format!(
                "failure getting primary key in `value()`: {} -> {}",
                self.index.name(),
                Key::from(bytes).to_hex(),
            ))),
        }
    }

    fn key(&self) -> Result<Key, InternalError> {
        let Some(handle) = self.handle.as_ref().filter(|_| !self.status.is_end()) else {
            return Err(InternalError::cursor_misuse("cannot read key of end iterator"));
        };

        let (status, bytes) = handle.key();
        if status.is_end() {
            return Err(InternalError::cursor_misuse("Error getting key"));
        }

        Ok(Key::from(bytes))
    }

    fn decode_key<K: FromKey>(&self) -> Result<K, InternalError> {
        let key = self.key()?;
        let field = key.get(self.index.prefix().len()..).unwrap_or_default();

        let mut reader = KeyReader::new(field);
        let value = K::read_key(&mut reader)?;
        reader.finish()?;

        Ok(value)
    }

    fn key_compare(&self, key: &[u8]) -> Ordering {
        match &self.handle {
            Some(handle) if !self.status.is_end() => handle.key_compare(key),
            _ => Ordering::Greater,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self.is_end(), other.is_end()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => match (&self.handle, &other.handle) {
                (Some(a), Some(b)) => a.compare(b),
                _ => Ordering::Equal,
            },
        }
    }

    fn skip_erased(&mut self, forward: bool) {
        while self.status() == IteratorStatus::Erased {
            self.step(forward);
        }
    }
}

impl<R, H: KvHost> fmt::Debug for CursorBase<'_, R, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("index", &self.index.name())
            .field("handle", &self.handle)
            .field("status", &self.status)
            .finish()
    }
}

///
/// Cursor
///
/// Forward position within one index. Advancing moves toward larger keys;
/// the past-the-end position is terminal for advancing.
///

pub struct Cursor<'t, R, H: KvHost> {
    base: CursorBase<'t, R, H>,
}

impl<'t, R: Record, H: KvHost> Cursor<'t, R, H> {
    /// Unpositioned past-the-end sentinel.
    pub(crate) const fn end(table: &'t Table<R, H>, index: &'t BoundIndex<R>) -> Self {
        Self {
            base: CursorBase::sentinel(table, index),
        }
    }

    /// First entry at or after `key` (a fully-qualified storage key).
    pub(crate) fn lower_bound(
        table: &'t Table<R, H>,
        index: &'t BoundIndex<R>,
        key: &[u8],
    ) -> Self {
        let mut base = CursorBase::open(table, index);
        base.lower_bound(key);

        Self { base }
    }

    #[must_use]
    pub fn is_end(&self) -> bool {
        self.base.is_end()
    }

    #[must_use]
    pub fn status(&self) -> IteratorStatus {
        self.base.status()
    }

    /// Record at this position; secondary cursors resolve through the
    /// primary index.
    pub fn value(&self) -> Result<R, InternalError> {
        self.base.value()
    }

    /// Raw composite key at this position. Readable after erasure.
    pub fn key(&self) -> Result<Key, InternalError> {
        self.base.key()
    }

    /// Decode the index field part of the current key.
    pub fn decode_key<K: FromKey>(&self) -> Result<K, InternalError> {
        self.base.decode_key()
    }

    /// Compare the current key with `key`; an end cursor compares greater.
    #[must_use]
    pub fn key_compare(&self, key: &[u8]) -> Ordering {
        self.base.key_compare(key)
    }

    /// Move to the next larger key.
    pub fn advance(&mut self) -> Result<(), InternalError> {
        if self.base.is_end() {
            return Err(InternalError::cursor_misuse("cannot increment end iterator"));
        }
        self.base.step(true);

        Ok(())
    }

    /// Move to the next smaller key; from end this is the last key.
    /// Retreating from the first key fails and keeps the cursor there.
    pub fn retreat(&mut self) -> Result<(), InternalError> {
        self.base.retreat(false)
    }
}

impl<R: Record, H: KvHost> Iterator for Cursor<'_, R, H> {
    type Item = Result<R, InternalError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.base.skip_erased(true);
        if self.base.is_end() {
            return None;
        }

        let item = self.base.value();
        self.base.step(true);

        Some(item)
    }
}

impl<R: Record, H: KvHost> PartialEq for Cursor<'_, R, H> {
    fn eq(&self, other: &Self) -> bool {
        self.base.compare(&other.base) == Ordering::Equal
    }
}

impl<R: Record, H: KvHost> PartialOrd for Cursor<'_, R, H> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.base.compare(&other.base))
    }
}

impl<R, H: KvHost> fmt::Debug for Cursor<'_, R, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.base.fmt(f)
    }
}

///
/// ReverseCursor
///
/// Reverse position within one index. Advancing moves toward smaller keys;
/// the before-the-beginning position (`rend`) is terminal for advancing.
///

pub struct ReverseCursor<'t, R, H: KvHost> {
    base: CursorBase<'t, R, H>,
}

impl<'t, R: Record, H: KvHost> ReverseCursor<'t, R, H> {
    /// Unpositioned before-the-beginning sentinel.
    pub(crate) const fn rend(table: &'t Table<R, H>, index: &'t BoundIndex<R>) -> Self {
        Self {
            base: CursorBase::sentinel(table, index),
        }
    }

    /// Positioned at the largest key of the index.
    pub(crate) fn rbegin(table: &'t Table<R, H>, index: &'t BoundIndex<R>) -> Self {
        let mut base = CursorBase::open(table, index);
        base.step(false);

        Self { base }
    }

    #[must_use]
    pub fn is_end(&self) -> bool {
        self.base.is_end()
    }

    #[must_use]
    pub fn status(&self) -> IteratorStatus {
        self.base.status()
    }

    pub fn value(&self) -> Result<R, InternalError> {
        self.base.value()
    }

    pub fn key(&self) -> Result<Key, InternalError> {
        self.base.key()
    }

    pub fn decode_key<K: FromKey>(&self) -> Result<K, InternalError> {
        self.base.decode_key()
    }

    #[must_use]
    pub fn key_compare(&self, key: &[u8]) -> Ordering {
        self.base.key_compare(key)
    }

    /// Move to the next smaller key.
    pub fn advance(&mut self) -> Result<(), InternalError> {
        if self.base.is_end() {
            return Err(InternalError::cursor_misuse("incremented past the end"));
        }
        self.base.step(false);

        Ok(())
    }

    /// Move to the next larger key; from `rend` this is the first key.
    pub fn retreat(&mut self) -> Result<(), InternalError> {
        self.base.retreat(true)
    }
}

impl<R: Record, H: KvHost> Iterator for ReverseCursor<'_, R, H> {
    type Item = Result<R, InternalError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.base.skip_erased(false);
        if self.base.is_end() {
            return None;
        }

        let item = self.base.value();
        self.base.step(false);

        Some(item)
    }
}

impl<R: Record, H: KvHost> PartialEq for ReverseCursor<'_, R, H> {
    fn eq(&self, other: &Self) -> bool {
        self.base.compare(&other.base) == Ordering::Equal
    }
}

impl<R: Record, H: KvHost> PartialOrd for ReverseCursor<'_, R, H> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.base.compare(&other.base))
    }
}

impl<R, H: KvHost> fmt::Debug for ReverseCursor<'_, R, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.base.fmt(f)
    }
}
