//! Operational signals derived from a tank's series.
//!
//! - `refill`: refill recommendation from recent depletion and level.
//! - `staleness`: whether a feed has stopped updating.

pub mod refill;
pub mod staleness;
