//! SQLite database modules.
//!
//! Provides connection management, schema definitions, and Diesel model
//! types for the marketplace tables.

pub mod connection;
pub mod model;
pub mod schema;

pub use connection::{Database, DbConnection, DbPool};
