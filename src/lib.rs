//! Tank level monitoring: smoothing, flow decomposition, usage aggregation
//! and refill recommendations for remote fill-level sensor feeds.
//!
//! The library is pure computation over already-fetched readings. Use
//! [`pipeline::evaluate_tank`] for one tank or [`pipeline::evaluate_fleet`]
//! for several, with parameters from [`config::MonitorConfig`].

pub mod alert;
pub mod analysis;
pub mod config;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod tanks;
