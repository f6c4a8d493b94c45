//! Infrastructure layer.
//!
//! Provides technical concerns that support the application without containing
//! business logic. This layer handles configuration, service wiring, operator
//! use-cases and the metering schedule.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`config`] - Configuration loading and validation
//! - [`operator`] - Operator use-cases behind the CLI
//! - [`scheduler`] - Recurring metering cycles with graceful shutdown

pub mod bootstrap;
pub mod config;
pub mod operator;
pub mod scheduler;
