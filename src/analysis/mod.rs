//! Signal processing for tank level series.
//!
//! Each submodule is one pure stage; `crate::pipeline` chains them:
//! normalize → smoothing → trend → flow → aggregate.
//!
//! Submodules:
//! - `normalize`: raw percentages to clamped liters.
//! - `smoothing`: trailing moving average.
//! - `trend`: lagged-slope inflow/usage/ambiguous labels.
//! - `flow`: label-gated split of each step into inflow and usage.
//! - `aggregate`: hourly/daily buckets, average daily usage, peak hour.

pub mod aggregate;
pub mod flow;
pub mod normalize;
pub mod smoothing;
pub mod trend;
