//! Turning already-fetched feed data into `Reading`s.
//!
//! Fetching is not done here; callers hand over text they obtained however
//! they like (file, HTTP, cache).

pub mod feed;
