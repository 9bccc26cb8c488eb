use crate::{
    db::{index::BoundIndex, table::Table},
    error::InternalError,
    host::KvHost,
    key::Key,
    obs::sink::{self, MetricsEvent},
    serialize::Record,
};

///
/// PreparedIndexMutation
///
/// One mechanical secondary index write; `None` erases the entry.
///

#[derive(Debug)]
struct PreparedIndexMutation {
    key: Key,
    value: Option<Key>,
}

///
/// SecondaryPlan
///
/// Every secondary index write for one put or erase, validated up front so
/// apply never fails halfway.
///

#[derive(Debug, Default)]
pub(super) struct SecondaryPlan {
    mutations: Vec<PreparedIndexMutation>,
    inserts: u64,
    removes: u64,
}

impl SecondaryPlan {
    fn link(&mut self, key: Key, primary_key: &Key) {
        self.mutations.push(PreparedIndexMutation {
            key,
            value: Some(primary_key.clone()),
        });
        self.inserts += 1;
    }

    fn unlink(&mut self, key: Key) {
        self.mutations.push(PreparedIndexMutation { key, value: None });
        self.removes += 1;
    }
}

/// Plan secondary maintenance for storing `record` over `old`.
///
/// Per index:
/// - insert: the new secondary key must be free;
/// - update, key unchanged: nothing to do;
/// - update, key changed: the new key must be free or already point at this
///   record; the old entry is unlinked and the new one linked.
pub(super) fn plan<R: Record, H: KvHost>(
    table: &Table<R, H>,
    record: &R,
    old: Option<&R>,
    primary_key: &Key,
) -> Result<SecondaryPlan, InternalError> {
    let mut plan = SecondaryPlan::default();

    for index in table.secondaries() {
        let new_key = index.record_key(record)?;

        let Some(old) = old else {
            if table.host().kv_get(table.namespace(), &new_key).is_some() {
                return Err(conflict(table, index, true));
            }
            plan.link(new_key, primary_key);
            continue;
        };

        let old_key = index.record_key(old)?;
        if old_key == new_key {
            continue;
        }

        if let Some(owner) = table.read(&new_key)?
            && owner.as_slice() != primary_key.as_bytes()
        {
            return Err(conflict(table, index, false));
        }

        plan.unlink(old_key);
        plan.link(new_key, primary_key);
    }

    Ok(plan)
}

/// Plan removal of every secondary entry of `stored` that still points at
/// `primary_key`.
pub(super) fn plan_erase<R: Record, H: KvHost>(
    table: &Table<R, H>,
    stored: &R,
    primary_key: &Key,
) -> Result<SecondaryPlan, InternalError> {
    let mut plan = SecondaryPlan::default();

    for index in table.secondaries() {
        let key = index.record_key(stored)?;
        let linked = table
            .read(&key)?
            .is_some_and(|owner| owner.as_slice() == primary_key.as_bytes());

        if linked {
            plan.unlink(key);
        }
    }

    Ok(plan)
}

/// Apply a validated plan. Host writes are infallible at this layer.
pub(super) fn apply<R: Record, H: KvHost>(table: &Table<R, H>, plan: &SecondaryPlan) {
    let ns = table.namespace();

    for mutation in &plan.mutations {
        match &mutation.value {
            Some(value) => table.host().kv_set(ns, &mutation.key, value),
            None => table.host().kv_erase(ns, &mutation.key),
        };
    }

    if plan.inserts > 0 || plan.removes > 0 {
        sink::record(MetricsEvent::IndexDelta {
            table: table.name(),
            inserts: plan.inserts,
            removes: plan.removes,
        });
    }
}

fn conflict<R: Record, H: KvHost>(
    table: &Table<R, H>,
    index: &BoundIndex<R>,
    insert: bool,
) -> InternalError {
    sink::record(MetricsEvent::SecondaryConflict {
        table: table.name(),
    });

    InternalError::secondary_conflict(
        &table.name().to_string(),
        &index.name().to_string(),
        insert,
    )
}
