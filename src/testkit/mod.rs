//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`domain`] - Builders for campaigns, ads, channels, placements.
//! - [`db`] - In-memory database fixture and row seeding.
//! - [`delivery`] - `ScriptedDelivery`, a [`Delivery`](crate::port::Delivery)
//!   fake with queued outcomes and a call log.
//! - [`metrics`] - `ScriptedMetrics`, a settable snapshot source.
//! - [`notifier`] - `RecordingNotifier`, which keeps every event.
//! - [`config`] - Canonical test configurations.

pub mod config;
pub mod db;
pub mod delivery;
pub mod domain;
pub mod metrics;
pub mod notifier;
