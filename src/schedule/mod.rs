//! Schedule generation: slot allocation, free-text aggregation, window
//! resolution, and event materialization.
//!
//! Everything in this module is pure — no I/O, no clock reads. The service
//! layer supplies connections and timestamps.

pub mod aggregate;
pub mod materialize;
pub mod resolve;
pub mod slots;

pub use aggregate::aggregate;
pub use materialize::{build_event_title, materialize, midnight_utc};
pub use resolve::{resolve_food_timing, resolve_window};
pub use slots::allocate;
