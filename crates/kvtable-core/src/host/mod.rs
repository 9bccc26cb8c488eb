//! Module: host
//! Responsibility: the primitive ordered key-value store this crate layers on.
//! Does not own: durability, crash consistency or cross-context isolation;
//! those belong to whoever implements [`KvHost`].
//! Boundary: every byte that reaches storage crosses this trait.

mod memory;

pub use memory::MemoryHost;

use crate::{error::InternalError, name::Name};
use std::{cmp::Ordering, fmt, rc::Rc};

///
/// Namespace
///
/// Scope of every host call: a database selector plus the owning contract.
/// Two namespaces never observe each other's keys.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Namespace {
    pub db: Name,
    pub contract: Name,
}

impl Namespace {
    #[must_use]
    pub const fn new(db: Name, contract: Name) -> Self {
        Self { db, contract }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.contract, self.db)
    }
}

///
/// IteratorStatus
///
/// Position state reported by every iterator host call.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IteratorStatus {
    /// Positioned at a live key-value pair.
    Ok,
    /// The pair it was positioned at has been erased since.
    Erased,
    /// Out of bounds.
    End,
}

impl IteratorStatus {
    pub const OK_CODE: i32 = 0;
    pub const ERASED_CODE: i32 = -1;
    pub const END_CODE: i32 = -2;

    /// Map a raw host status code; unknown negative codes read as `End`.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            Self::OK_CODE => Self::Ok,
            Self::ERASED_CODE => Self::Erased,
            _ => Self::End,
        }
    }

    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Ok => Self::OK_CODE,
            Self::Erased => Self::ERASED_CODE,
            Self::End => Self::END_CODE,
        }
    }

    #[must_use]
    pub const fn is_end(self) -> bool {
        matches!(self, Self::End)
    }
}

///
/// KvHost
///
/// Primitive ordered byte-string store.
///
/// Iterator contract:
/// - a new iterator is at end;
/// - `next` from end moves to the first key of the prefix range and `prev`
///   from end moves to the last;
/// - stepping past either edge returns the iterator to end;
/// - `lower_bound` positions at the first key ≥ the search key inside the
///   prefix range;
/// - an iterator whose pair was erased reports `Erased` but keeps its key
///   for ordering and stepping.
///
/// Handle `0` is never issued.
///

pub trait KvHost {
    /// Store `value` under `key`; returns the billable size delta.
    fn kv_set(&self, ns: Namespace, key: &[u8], value: &[u8]) -> i64;

    /// Look up `key`; on a hit the value becomes readable via `kv_get_data`.
    fn kv_get(&self, ns: Namespace, key: &[u8]) -> Option<u32>;

    /// Copy bytes of the most recent `kv_get` hit in `db`, starting at
    /// `offset`; returns the number of bytes copied.
    fn kv_get_data(&self, db: Name, offset: u32, dest: &mut [u8]) -> u32;

    /// Erase `key`; returns the billable size delta.
    fn kv_erase(&self, ns: Namespace, key: &[u8]) -> i64;

    fn kv_it_create(&self, ns: Namespace, prefix: &[u8]) -> u32;
    fn kv_it_destroy(&self, itr: u32);
    fn kv_it_status(&self, itr: u32) -> i32;

    /// Three-way position comparison of two iterators over the same prefix.
    fn kv_it_compare(&self, itr_a: u32, itr_b: u32) -> i32;

    /// Three-way comparison of the iterator's key against `key`; end
    /// compares greater than every key.
    fn kv_it_key_compare(&self, itr: u32, key: &[u8]) -> i32;

    fn kv_it_move_to_end(&self, itr: u32) -> i32;
    fn kv_it_next(&self, itr: u32) -> i32;
    fn kv_it_prev(&self, itr: u32) -> i32;
    fn kv_it_lower_bound(&self, itr: u32, key: &[u8]) -> i32;

    /// Copy the current key from `offset`; returns `(status, actual_size)`.
    fn kv_it_key(&self, itr: u32, offset: u32, dest: &mut [u8]) -> (i32, u32);

    /// Copy the current value from `offset`; returns `(status, actual_size)`.
    fn kv_it_value(&self, itr: u32, offset: u32, dest: &mut [u8]) -> (i32, u32);
}

macro_rules! forward_kv_host {
    ($($ty:ty),*) => {
        $(
            impl<H: KvHost + ?Sized> KvHost for $ty {
                fn kv_set(&self, ns: Namespace, key: &[u8], value: &[u8]) -> i64 {
                    (**self).kv_set(ns, key, value)
                }
                fn kv_get(&self, ns: Namespace, key: &[u8]) -> Option<u32> {
                    (**self).kv_get(ns, key)
                }
                fn kv_get_data(&self, db: Name, offset: u32, dest: &mut [u8]) -> u32 {
                    (**self).kv_get_data(db, offset, dest)
                }
                fn kv_erase(&self, ns: Namespace, key: &[u8]) -> i64 {
                    (**self).kv_erase(ns, key)
                }
                fn kv_it_create(&self, ns: Namespace, prefix: &[u8]) -> u32 {
                    (**self).kv_it_create(ns, prefix)
                }
                fn kv_it_destroy(&self, itr: u32) {
                    (**self).kv_it_destroy(itr);
                }
                fn kv_it_status(&self, itr: u32) -> i32 {
                    (**self).kv_it_status(itr)
                }
                fn kv_it_compare(&self, itr_a: u32, itr_b: u32) -> i32 {
                    (**self).kv_it_compare(itr_a, itr_b)
                }
                fn kv_it_key_compare(&self, itr: u32, key: &[u8]) -> i32 {
                    (**self).kv_it_key_compare(itr, key)
                }
                fn kv_it_move_to_end(&self, itr: u32) -> i32 {
                    (**self).kv_it_move_to_end(itr)
                }
                fn kv_it_next(&self, itr: u32) -> i32 {
                    (**self).kv_it_next(itr)
                }
                fn kv_it_prev(&self, itr: u32) -> i32 {
                    (**self).kv_it_prev(itr)
                }
                fn kv_it_lower_bound(&self, itr: u32, key: &[u8]) -> i32 {
                    (**self).kv_it_lower_bound(itr, key)
                }
                fn kv_it_key(&self, itr: u32, offset: u32, dest: &mut [u8]) -> (i32, u32) {
                    (**self).kv_it_key(itr, offset, dest)
                }
                fn kv_it_value(&self, itr: u32, offset: u32, dest: &mut [u8]) -> (i32, u32) {
                    (**self).kv_it_value(itr, offset, dest)
                }
            }
        )*
    };
}

forward_kv_host!(&H, Rc<H>, Box<H>);

///
/// Exact-size reads
///

/// Point lookup returning the stored bytes, if any.
pub(crate) fn read_value<H: KvHost + ?Sized>(
    host: &H,
    ns: Namespace,
    key: &[u8],
) -> Result<Option<Vec<u8>>, InternalError> {
    let Some(size) = host.kv_get(ns, key) else {
        return Ok(None);
    };

    let mut buf = vec![0u8; size as usize];
    let copied = host.kv_get_data(ns.db, 0, &mut buf);
    if copied != size {
        return Err(InternalError::host_corruption(format!(
            "short value read from host: expected {size} bytes, copied {copied}"
        )));
    }

    Ok(Some(buf))
}

///
/// IteratorHandle
///
/// Sole owner of one host iterator; destroyed exactly once on drop.
/// Not `Clone`: moving the handle moves ownership.
///

pub struct IteratorHandle<'h, H: KvHost + ?Sized> {
    host: &'h H,
    raw: u32,
}

impl<'h, H: KvHost + ?Sized> IteratorHandle<'h, H> {
    /// Create a host iterator over `prefix`, initially at end.
    pub fn create(host: &'h H, ns: Namespace, prefix: &[u8]) -> Self {
        let raw = host.kv_it_create(ns, prefix);
        debug_assert_ne!(raw, 0, "host issued iterator handle 0");

        Self { host, raw }
    }

    #[must_use]
    pub const fn raw(&self) -> u32 {
        self.raw
    }

    #[must_use]
    pub fn status(&self) -> IteratorStatus {
        IteratorStatus::from_code(self.host.kv_it_status(self.raw))
    }

    pub fn next(&self) -> IteratorStatus {
        IteratorStatus::from_code(self.host.kv_it_next(self.raw))
    }

    pub fn prev(&self) -> IteratorStatus {
        IteratorStatus::from_code(self.host.kv_it_prev(self.raw))
    }

    pub fn lower_bound(&self, key: &[u8]) -> IteratorStatus {
        IteratorStatus::from_code(self.host.kv_it_lower_bound(self.raw, key))
    }

    pub fn move_to_end(&self) -> IteratorStatus {
        IteratorStatus::from_code(self.host.kv_it_move_to_end(self.raw))
    }

    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        self.host.kv_it_compare(self.raw, other.raw).cmp(&0)
    }

    #[must_use]
    pub fn key_compare(&self, key: &[u8]) -> Ordering {
        self.host.kv_it_key_compare(self.raw, key).cmp(&0)
    }

    /// Read the current key into an exactly-sized buffer.
    pub fn key(&self) -> (IteratorStatus, Vec<u8>) {
        self.read_with(|dest, offset| self.host.kv_it_key(self.raw, offset, dest))
    }

    /// Read the current value into an exactly-sized buffer.
    pub fn value(&self) -> (IteratorStatus, Vec<u8>) {
        self.read_with(|dest, offset| self.host.kv_it_value(self.raw, offset, dest))
    }

    // Two-call protocol: size query with an empty buffer, then the copy.
    fn read_with(
        &self,
        read: impl Fn(&mut [u8], u32) -> (i32, u32),
    ) -> (IteratorStatus, Vec<u8>) {
        let (_, size) = read(&mut [], 0);
        let mut buf = vec![0u8; size as usize];
        let (status, actual) = read(&mut buf, 0);
        buf.truncate(actual.min(size) as usize);

        (IteratorStatus::from_code(status), buf)
    }
}

impl<H: KvHost + ?Sized> Drop for IteratorHandle<'_, H> {
    fn drop(&mut self) {
        self.host.kv_it_destroy(self.raw);
    }
}

impl<H: KvHost + ?Sized> fmt::Debug for IteratorHandle<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IteratorHandle").field(&self.raw).finish()
    }
}
