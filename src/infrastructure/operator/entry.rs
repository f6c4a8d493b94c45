//! Concrete operator used by the binary.

/// Operator backed by the configured SQLite database.
#[derive(Debug, Clone, Copy, Default)]
pub struct Operator;
