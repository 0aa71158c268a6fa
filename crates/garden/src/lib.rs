//! Sensor state derivation and decision engine for a monitored growing environment.
//!
//! Raw readings flow through [`state`] into a point-in-time snapshot, which
//! [`decision`] classifies into an outcome. [`cycle`] ties the two together and
//! carries the light hysteresis state from one evaluation to the next.

pub mod config;
pub mod cycle;
pub mod decision;
pub mod error;
pub mod readings;
pub mod state;
mod tags;
pub mod telemetry;

pub use tags::UnknownTag;
