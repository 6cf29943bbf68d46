//! Engine errors
//!
//! The error taxonomy every engine operation returns. Each kind is a
//! definitive outcome of validating against current state; none is retried
//! internally. Only `Storage` leaves the operation's effect unknown, and
//! callers must treat it as "retry the whole user action".

use bankbot_core::TransferStatus;
use bankbot_persistence::StoreError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Ledger & transfer engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    // === Balance errors ===
    #[error("Insufficient funds: need {needed}, available {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },

    #[error("Insufficient pool funds: need {needed}, available {available}")]
    InsufficientPoolFunds { needed: Decimal, available: Decimal },

    #[error("Insufficient collateral: required {required}, available {available}")]
    InsufficientCollateral {
        required: Decimal,
        available: Decimal,
    },

    // === Validation errors ===
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid bet: must be between {min} and {max}")]
    InvalidBet { min: Decimal, max: Decimal },

    #[error("Cannot transfer to yourself")]
    SelfTransfer,

    // === Workflow errors ===
    #[error("Not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Operation not permitted for this user")]
    Forbidden,

    #[error("Request already {status}")]
    AlreadyFinal { status: TransferStatus },

    #[error("Daily gift already claimed; retry in {retry_after_secs}s")]
    CooldownActive { retry_after_secs: i64 },

    // === Wrapped errors ===
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_insufficient_funds(&self) -> bool {
        matches!(self, Self::InsufficientFunds { .. })
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(StoreError::Database(err))
    }
}
