//! Metrics sink boundary.
//!
//! Query and store code MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.

use crate::{
    db::access::PlanKind,
    error::ErrorClass,
    obs::metrics::{self, EventReport, bump},
};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = const { RefCell::new(None) };
}

///
/// FilterKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterKind {
    Account,
    Ledger,
    Operation,
    Transaction,
    LiquidityPool,
    Page,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    QueryStart,
    FilterApplied { filter: FilterKind },
    Latched { class: ErrorClass },
    Plan { kind: PlanKind },
    RowsScanned { rows: u64 },
    QueryFinish { rows_returned: u64 },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default sink writing into the thread-local counter state.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::QueryStart => bump(&mut m.ops.queries_started, 1),

            MetricsEvent::FilterApplied { filter } => {
                let counter = match filter {
                    FilterKind::Account => &mut m.filters.account,
                    FilterKind::Ledger => &mut m.filters.ledger,
                    FilterKind::Operation => &mut m.filters.operation,
                    FilterKind::Transaction => &mut m.filters.transaction,
                    FilterKind::LiquidityPool => &mut m.filters.liquidity_pool,
                    FilterKind::Page => &mut m.filters.page,
                };
                bump(counter, 1);
            }

            MetricsEvent::Latched { class } => {
                bump(&mut m.ops.queries_latched, 1);
                match class {
                    ErrorClass::InvalidInput => bump(&mut m.ops.errors_invalid_input, 1),
                    ErrorClass::NotFound => bump(&mut m.ops.errors_not_found, 1),
                    ErrorClass::Unavailable
                    | ErrorClass::Cancelled
                    | ErrorClass::Corruption
                    | ErrorClass::Internal => bump(&mut m.ops.errors_storage, 1),
                }
            }

            MetricsEvent::Plan { kind } => match kind {
                PlanKind::Keys => bump(&mut m.ops.plan_keys, 1),
                PlanKind::Range => bump(&mut m.ops.plan_range, 1),
                PlanKind::FullScan => bump(&mut m.ops.plan_full_scan, 1),
            },

            MetricsEvent::RowsScanned { rows } => bump(&mut m.ops.rows_scanned, rows),

            MetricsEvent::QueryFinish { rows_returned } => {
                bump(&mut m.ops.queries_executed, 1);
                bump(&mut m.ops.rows_returned, rows_returned);
            }
        });
    }
}

pub(crate) fn record(event: MetricsEvent) {
    let override_sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match override_sink {
        Some(sink) => sink.record(event),
        None => GlobalMetricsSink.record(event),
    }
}

/// Snapshot the current metrics state.
#[must_use]
pub fn metrics_report() -> EventReport {
    metrics::report()
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override on this thread.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///
