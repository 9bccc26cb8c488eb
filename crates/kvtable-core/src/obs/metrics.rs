use crate::name::Name;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for table operations.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub tables: BTreeMap<Name, TableCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Writes
    pub put_inserts: u64,
    pub put_updates: u64,
    pub erase_calls: u64,
    pub erase_misses: u64,

    // Secondary index maintenance
    pub index_inserts: u64,
    pub index_removes: u64,
    pub secondary_conflicts: u64,

    // Reads
    pub lookup_hits: u64,
    pub lookup_misses: u64,
    pub range_calls: u64,
    pub rows_ranged: u64,
    pub cursors_opened: u64,
}

///
/// TableCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableCounters {
    pub put_inserts: u64,
    pub put_updates: u64,
    pub erase_calls: u64,
    pub index_inserts: u64,
    pub index_removes: u64,
    pub secondary_conflicts: u64,
    pub lookup_hits: u64,
    pub lookup_misses: u64,
    pub range_calls: u64,
    pub rows_ranged: u64,
    pub cursors_opened: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters.
pub(crate) fn reset() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    /// Counters summed over every table.
    pub counters: EventOps,

    /// Per-table counters, ordered by table name.
    pub tables: Vec<TableSummary>,
}

impl EventReport {
    /// Counters for one table, if it has recorded anything.
    #[must_use]
    pub fn table(&self, table: Name) -> Option<&TableSummary> {
        self.tables.iter().find(|summary| summary.table == table)
    }
}

///
/// TableSummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TableSummary {
    pub table: Name,
    pub counters: TableCounters,
    pub avg_rows_per_range: f64,
}

/// Build a report from the in-memory counters.
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub(crate) fn report() -> EventReport {
    let snap = with_state(Clone::clone);

    let tables = snap
        .tables
        .into_iter()
        .map(|(table, counters)| {
            let avg_rows_per_range = if counters.range_calls > 0 {
                counters.rows_ranged as f64 / counters.range_calls as f64
            } else {
                0.0
            };

            TableSummary {
                table,
                counters,
                avg_rows_per_range,
            }
        })
        .collect();

    EventReport {
        counters: snap.ops,
        tables,
    }
}
