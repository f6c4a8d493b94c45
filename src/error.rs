use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Ledger errors. Any of these leaves the atomic unit fully rolled back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient funds for {user}: requested {requested}, available {available}")]
    InsufficientFunds {
        user: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("{entity} {id} is {status}; cannot {action}")]
    InvalidStateTransition {
        entity: &'static str,
        id: String,
        status: String,
        action: &'static str,
    },

    #[error("creator {creator} is not assigned to escrow {escrow}")]
    NotAssigned { creator: String, escrow: String },

    #[error("no escrowed earnings to release for {0}")]
    NoFundsToRelease(String),

    #[error("no balance account for user {0}")]
    AccountNotFound(String),

    #[error("escrow {0} not found")]
    EscrowNotFound(String),

    #[error("withdrawal {0} not found")]
    WithdrawalNotFound(String),

    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("reference {0} has already been used")]
    DuplicateReference(String),

    #[error("could not generate a unique {prefix} reference after {attempts} attempts")]
    ReferenceExhausted { prefix: String, attempts: u32 },

    #[error("ledger replay for {user} diverges: {detail}")]
    ReplayMismatch { user: String, detail: String },
}

/// Metering errors scoped to one placement's settlement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeteringError {
    #[error("no pending escrow for campaign {campaign} and creator {creator} (placement {placement})")]
    NoMatchingEscrow {
        placement: String,
        campaign: String,
        creator: String,
    },
}

/// Failures reported by the delivery collaborator. Never fatal to a batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("delivery rejected: {0}")]
    Rejected(String),

    #[error("placement {0} has no live content to remove")]
    MissingContentRef(String),

    #[error("delivery unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Metering(#[from] MeteringError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        Error::Database(err.to_string())
    }
}

impl Error {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn ledger_errors_convert() {
        let err: Error = LedgerError::NonPositiveAmount(dec!(-1)).into();
        assert!(matches!(
            err,
            Error::Ledger(LedgerError::NonPositiveAmount(_))
        ));
        assert_eq!(err.to_string(), "amount must be positive, got -1");
    }

    #[test]
    fn diesel_errors_become_database_errors() {
        let err: Error = diesel::result::Error::NotFound.into();
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn insufficient_funds_message() {
        let err = LedgerError::InsufficientFunds {
            user: "adv".into(),
            requested: dec!(150.00),
            available: dec!(100.00),
        };
        assert_eq!(
            err.to_string(),
            "insufficient funds for adv: requested 150.00, available 100.00"
        );
    }
}
