//! Observability: runtime counters and the sink abstraction that feeds them.
//!
//! This module never touches the host store.
//! Tables report what they did through `sink::record`; storage inspection
//! belongs to the host implementation (see `MemoryHost::entries`).

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport, TableCounters, TableSummary};
pub use sink::{MetricsEvent, MetricsSink, PutKind, metrics_report, metrics_reset, with_metrics_sink};
