use crate::{
    host::{IteratorStatus, KvHost, Namespace},
    key::Key,
    name::Name,
};
use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
    ops::Bound,
};

type Entries = BTreeMap<Vec<u8>, Vec<u8>>;

///
/// MemoryHost
///
/// Process-local implementation of [`KvHost`] over ordered maps.
/// One map per namespace; iterators remember their key so they survive
/// erasure of the pair they point at.
///

#[derive(Debug, Default)]
pub struct MemoryHost {
    state: RefCell<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    stores: BTreeMap<Namespace, Entries>,
    last_get: HashMap<Name, Vec<u8>>,
    iterators: HashMap<u32, MemoryIterator>,
    next_handle: u32,
}

#[derive(Debug)]
struct MemoryIterator {
    ns: Namespace,
    prefix: Vec<u8>,
    position: Option<Vec<u8>>,
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries stored in `ns`.
    #[must_use]
    pub fn len(&self, ns: Namespace) -> usize {
        self.state.borrow().stores.get(&ns).map_or(0, BTreeMap::len)
    }

    #[must_use]
    pub fn is_empty(&self, ns: Namespace) -> bool {
        self.len(ns) == 0
    }

    /// Snapshot all entries of `ns` (diagnostics only).
    #[must_use]
    pub fn entries(&self, ns: Namespace) -> Vec<(Key, Vec<u8>)> {
        self.state
            .borrow()
            .stores
            .get(&ns)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(k, v)| (Key::from(k.clone()), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of iterators created and not yet destroyed.
    #[must_use]
    pub fn live_iterators(&self) -> usize {
        self.state.borrow().iterators.len()
    }

    // Advance/retreat/seek share one shape: compute a new position from the
    // iterator's prefix range, store it, report the resulting status.
    fn reposition(
        &self,
        itr: u32,
        seek: impl FnOnce(&Entries, &[u8], Option<&[u8]>) -> Option<Vec<u8>>,
    ) -> i32 {
        let mut state = self.state.borrow_mut();
        let MemoryState {
            stores, iterators, ..
        } = &mut *state;

        let Some(it) = iterators.get_mut(&itr) else {
            debug_assert!(false, "invalid iterator handle {itr}");
            return IteratorStatus::END_CODE;
        };

        let empty = Entries::new();
        let entries = stores.get(&it.ns).unwrap_or(&empty);
        it.position = seek(entries, &it.prefix, it.position.as_deref());

        status_of(entries, it.position.as_deref()).code()
    }

    fn read_current(&self, itr: u32, offset: u32, dest: &mut [u8], value: bool) -> (i32, u32) {
        let state = self.state.borrow();
        let Some(it) = state.iterators.get(&itr) else {
            debug_assert!(false, "invalid iterator handle {itr}");
            return (IteratorStatus::END_CODE, 0);
        };

        let entries = state.stores.get(&it.ns);
        let Some(position) = it.position.as_deref() else {
            return (IteratorStatus::END_CODE, 0);
        };
        let stored = entries.and_then(|e| e.get(position));

        let (status, bytes) = match (stored, value) {
            (None, true) => return (IteratorStatus::ERASED_CODE, 0),
            (None, false) => (IteratorStatus::Erased, position),
            (Some(v), true) => (IteratorStatus::Ok, v.as_slice()),
            (Some(_), false) => (IteratorStatus::Ok, position),
        };

        (status.code(), copy_from(bytes, offset, dest))
    }
}

fn status_of(entries: &Entries, position: Option<&[u8]>) -> IteratorStatus {
    match position {
        None => IteratorStatus::End,
        Some(key) if entries.contains_key(key) => IteratorStatus::Ok,
        Some(_) => IteratorStatus::Erased,
    }
}

fn copy_from(bytes: &[u8], offset: u32, dest: &mut [u8]) -> u32 {
    let start = (offset as usize).min(bytes.len());
    let available = &bytes[start..];
    let n = available.len().min(dest.len());
    dest[..n].copy_from_slice(&available[..n]);

    u32::try_from(bytes.len()).unwrap_or(u32::MAX)
}

fn first_at_or_after(entries: &Entries, prefix: &[u8], from: &[u8]) -> Option<Vec<u8>> {
    let lo = if from > prefix { from } else { prefix };

    entries
        .range::<[u8], _>((Bound::Included(lo), Bound::Unbounded))
        .next()
        .map(|(k, _)| k)
        .filter(|k| k.starts_with(prefix))
        .cloned()
}

fn first_after(entries: &Entries, prefix: &[u8], from: &[u8]) -> Option<Vec<u8>> {
    entries
        .range::<[u8], _>((Bound::Excluded(from), Bound::Unbounded))
        .next()
        .map(|(k, _)| k)
        .filter(|k| k.starts_with(prefix))
        .cloned()
}

fn last_before(entries: &Entries, prefix: &[u8], before: Option<&[u8]>) -> Option<Vec<u8>> {
    let successor = prefix_successor(prefix);
    let upper = match (before, successor.as_deref()) {
        (Some(before), Some(successor)) => Bound::Excluded(before.min(successor)),
        (Some(bound), None) | (None, Some(bound)) => Bound::Excluded(bound),
        (None, None) => Bound::Unbounded,
    };

    entries
        .range::<[u8], _>((Bound::Included(prefix), upper))
        .next_back()
        .map(|(k, _)| k)
        .filter(|k| k.starts_with(prefix))
        .cloned()
}

// Smallest byte string greater than every string starting with `prefix`.
fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut out = prefix.to_vec();
    while let Some(last) = out.pop() {
        if last < u8::MAX {
            out.push(last + 1);
            return Some(out);
        }
    }

    None
}

fn size_delta(old: usize, new: usize) -> i64 {
    i64::try_from(new).unwrap_or(i64::MAX) - i64::try_from(old).unwrap_or(i64::MAX)
}

impl KvHost for MemoryHost {
    fn kv_set(&self, ns: Namespace, key: &[u8], value: &[u8]) -> i64 {
        let mut state = self.state.borrow_mut();
        let old = state
            .stores
            .entry(ns)
            .or_default()
            .insert(key.to_vec(), value.to_vec());

        match old {
            Some(old) => size_delta(old.len(), value.len()),
            None => size_delta(0, key.len() + value.len()),
        }
    }

    fn kv_get(&self, ns: Namespace, key: &[u8]) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        let value = state.stores.get(&ns)?.get(key)?.clone();
        let size = u32::try_from(value.len()).ok()?;
        state.last_get.insert(ns.db, value);

        Some(size)
    }

    fn kv_get_data(&self, db: Name, offset: u32, dest: &mut [u8]) -> u32 {
        let state = self.state.borrow();
        let Some(value) = state.last_get.get(&db) else {
            return 0;
        };

        let start = (offset as usize).min(value.len());
        let n = (value.len() - start).min(dest.len());
        dest[..n].copy_from_slice(&value[start..start + n]);

        u32::try_from(n).unwrap_or(u32::MAX)
    }

    fn kv_erase(&self, ns: Namespace, key: &[u8]) -> i64 {
        let mut state = self.state.borrow_mut();
        let removed = state.stores.get_mut(&ns).and_then(|e| e.remove(key));

        removed.map_or(0, |value| size_delta(key.len() + value.len(), 0))
    }

    fn kv_it_create(&self, ns: Namespace, prefix: &[u8]) -> u32 {
        let mut state = self.state.borrow_mut();
        state.next_handle = state.next_handle.wrapping_add(1).max(1);
        let handle = state.next_handle;
        state.iterators.insert(
            handle,
            MemoryIterator {
                ns,
                prefix: prefix.to_vec(),
                position: None,
            },
        );

        handle
    }

    fn kv_it_destroy(&self, itr: u32) {
        let removed = self.state.borrow_mut().iterators.remove(&itr);
        debug_assert!(removed.is_some(), "iterator {itr} destroyed twice");
    }

    fn kv_it_status(&self, itr: u32) -> i32 {
        let state = self.state.borrow();
        let Some(it) = state.iterators.get(&itr) else {
            return IteratorStatus::END_CODE;
        };

        match state.stores.get(&it.ns) {
            Some(entries) => status_of(entries, it.position.as_deref()).code(),
            None => status_of(&Entries::new(), it.position.as_deref()).code(),
        }
    }

    fn kv_it_compare(&self, itr_a: u32, itr_b: u32) -> i32 {
        let state = self.state.borrow();
        let a = state.iterators.get(&itr_a).and_then(|it| it.position.as_ref());
        let b = state.iterators.get(&itr_b).and_then(|it| it.position.as_ref());

        match (a, b) {
            (None, None) => 0,
            (None, Some(_)) => 1,
            (Some(_), None) => -1,
            (Some(a), Some(b)) => a.cmp(b) as i32,
        }
    }

    fn kv_it_key_compare(&self, itr: u32, key: &[u8]) -> i32 {
        let state = self.state.borrow();
        match state.iterators.get(&itr).and_then(|it| it.position.as_ref()) {
            None => 1,
            Some(position) => position.as_slice().cmp(key) as i32,
        }
    }

    fn kv_it_move_to_end(&self, itr: u32) -> i32 {
        self.reposition(itr, |_, _, _| None)
    }

    fn kv_it_next(&self, itr: u32) -> i32 {
        self.reposition(itr, |entries, prefix, position| match position {
            None => first_at_or_after(entries, prefix, prefix),
            Some(current) => first_after(entries, prefix, current),
        })
    }

    fn kv_it_prev(&self, itr: u32) -> i32 {
        self.reposition(itr, |entries, prefix, position| {
            last_before(entries, prefix, position)
        })
    }

    fn kv_it_lower_bound(&self, itr: u32, key: &[u8]) -> i32 {
        self.reposition(itr, |entries, prefix, _| {
            first_at_or_after(entries, prefix, key)
        })
    }

    fn kv_it_key(&self, itr: u32, offset: u32, dest: &mut [u8]) -> (i32, u32) {
        self.read_current(itr, offset, dest, false)
    }

    fn kv_it_value(&self, itr: u32, offset: u32, dest: &mut [u8]) -> (i32, u32) {
        self.read_current(itr, offset, dest, true)
    }
}

///
/// TESTS
///
