//! Domain validation errors.
//!
//! Raised when a domain invariant is violated: an illegal placement status
//! change, or a persisted enum value the engine does not recognise.

use thiserror::Error;

use super::placement::PlacementStatus;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The placement state machine has no edge between these states.
    #[error("placement cannot move from {from} to {to}")]
    InvalidPlacementTransition {
        /// Current status.
        from: PlacementStatus,
        /// Requested status.
        to: PlacementStatus,
    },

    /// A persisted status string did not match any known variant.
    #[error("unknown {kind} status '{value}'")]
    UnknownStatus {
        /// Which status family was being parsed.
        kind: &'static str,
        /// The unrecognised value.
        value: String,
    },

    /// A campaign objective string did not match any weight profile.
    #[error("unknown campaign objective '{0}'")]
    UnknownObjective(String),
}
