//! Metrics sink boundary.
//!
//! Table, index and cursor code MUST NOT touch obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
//!
//! This module is the only bridge between table operations and the
//! thread-local counter state.
use crate::{name::Name, obs::metrics};
use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn MetricsSink>> = RefCell::new(None);
}

///
/// PutKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PutKind {
    Insert,
    Update,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    Put {
        table: Name,
        kind: PutKind,
    },
    Erase {
        table: Name,
        found: bool,
    },
    IndexDelta {
        table: Name,
        inserts: u64,
        removes: u64,
    },
    SecondaryConflict {
        table: Name,
    },
    Lookup {
        table: Name,
        hit: bool,
    },
    RangeRows {
        table: Name,
        rows: u64,
    },
    CursorOpened {
        table: Name,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default sink that writes into the thread-local counters.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::Put { table, kind } => metrics::with_state_mut(|m| {
                let entry = m.tables.entry(table).or_default();
                match kind {
                    PutKind::Insert => {
                        m.ops.put_inserts = m.ops.put_inserts.saturating_add(1);
                        entry.put_inserts = entry.put_inserts.saturating_add(1);
                    }
                    PutKind::Update => {
                        m.ops.put_updates = m.ops.put_updates.saturating_add(1);
                        entry.put_updates = entry.put_updates.saturating_add(1);
                    }
                }
            }),

            MetricsEvent::Erase { table, found } => metrics::with_state_mut(|m| {
                m.ops.erase_calls = m.ops.erase_calls.saturating_add(1);
                if !found {
                    m.ops.erase_misses = m.ops.erase_misses.saturating_add(1);
                }
                let entry = m.tables.entry(table).or_default();
                entry.erase_calls = entry.erase_calls.saturating_add(1);
            }),

            MetricsEvent::IndexDelta {
                table,
                inserts,
                removes,
            } => metrics::with_state_mut(|m| {
                m.ops.index_inserts = m.ops.index_inserts.saturating_add(inserts);
                m.ops.index_removes = m.ops.index_removes.saturating_add(removes);
                let entry = m.tables.entry(table).or_default();
                entry.index_inserts = entry.index_inserts.saturating_add(inserts);
                entry.index_removes = entry.index_removes.saturating_add(removes);
            }),

            MetricsEvent::SecondaryConflict { table } => metrics::with_state_mut(|m| {
                m.ops.secondary_conflicts = m.ops.secondary_conflicts.saturating_add(1);
                let entry = m.tables.entry(table).or_default();
                entry.secondary_conflicts = entry.secondary_conflicts.saturating_add(1);
            }),

            MetricsEvent::Lookup { table, hit } => metrics::with_state_mut(|m| {
                let entry = m.tables.entry(table).or_default();
                if hit {
                    m.ops.lookup_hits = m.ops.lookup_hits.saturating_add(1);
                    entry.lookup_hits = entry.lookup_hits.saturating_add(1);
                } else {
                    m.ops.lookup_misses = m.ops.lookup_misses.saturating_add(1);
                    entry.lookup_misses = entry.lookup_misses.saturating_add(1);
                }
            }),

            MetricsEvent::RangeRows { table, rows } => metrics::with_state_mut(|m| {
                m.ops.range_calls = m.ops.range_calls.saturating_add(1);
                m.ops.rows_ranged = m.ops.rows_ranged.saturating_add(rows);
                let entry = m.tables.entry(table).or_default();
                entry.range_calls = entry.range_calls.saturating_add(1);
                entry.rows_ranged = entry.rows_ranged.saturating_add(rows);
            }),

            MetricsEvent::CursorOpened { table } => metrics::with_state_mut(|m| {
                m.ops.cursors_opened = m.ops.cursors_opened.saturating_add(1);
                let entry = m.tables.entry(table).or_default();
                entry.cursors_opened = entry.cursors_opened.saturating_add(1);
            }),
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // - `ptr` was produced from a live `&dyn MetricsSink` in `with_metrics_sink`,
        //   which restores the previous slot on every exit, including unwind.
        // - `record` is synchronous and never keeps `ptr` past this call.
        // - Only a shared reference is materialized, matching the caller's borrow.
        unsafe { (&*ptr).record(event) };
    } else {
        GLOBAL_METRICS_SINK.record(event);
    }
}

/// Snapshot the current thread's counters.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Clear the current thread's counters.
pub fn metrics_reset() {
    metrics::reset();
}

/// Run a closure with every metrics event routed to `sink`.
///
/// Overrides nest; the previous sink is restored when `f` returns or unwinds.
pub fn with_metrics_sink<T>(sink: &dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY:
    // - The pointer is installed only for this dynamic scope and `Guard`
    //   restores the previous slot on all exits.
    // - `record` dereferences it synchronously and never persists it.
    let sink_ptr = unsafe { std::mem::transmute::<&dyn MetricsSink, *const dyn MetricsSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink_ptr));
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///
