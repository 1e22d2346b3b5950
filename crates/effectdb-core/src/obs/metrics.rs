use serde::{Deserialize, Serialize};
use std::cell::RefCell;

///
/// EventState
/// Ephemeral, thread-local counters for query activity.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub filters: FilterCounters,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Builder lifecycle
    pub queries_started: u64,
    pub queries_executed: u64,
    pub queries_latched: u64,

    // Error classes seen when a builder latches
    pub errors_invalid_input: u64,
    pub errors_not_found: u64,
    pub errors_storage: u64,

    // Access paths chosen by the store
    pub plan_keys: u64,
    pub plan_range: u64,
    pub plan_full_scan: u64,

    // Rows touched
    pub rows_scanned: u64,
    pub rows_returned: u64,
}

///
/// FilterCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct FilterCounters {
    pub account: u64,
    pub ledger: u64,
    pub operation: u64,
    pub transaction: u64,
    pub liquidity_pool: u64,
    pub page: u64,
}

///
/// EventReport
/// Point-in-time copy of the counter state.
///

pub type EventReport = EventState;

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

pub(crate) fn report() -> EventReport {
    with_state(Clone::clone)
}

/// Reset all counters.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

/// Saturating in-place counter increment.
pub(crate) const fn bump(counter: &mut u64, by: u64) {
    *counter = counter.saturating_add(by);
}
