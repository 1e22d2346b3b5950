//! Observability: in-process query metrics and the sink boundary.
//!
//! Query and store code emit `MetricsEvent`s through `sink::record`; only
//! the sink touches the counter state.

pub(crate) mod metrics;
pub(crate) mod sink;

pub use metrics::EventReport;
pub use sink::{
    FilterKind, MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink,
};
