//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`InvalidInput`] thrown when arguments cannot be computed with (e.g. a
//!   zero baseline intensity).
//! - [`Validation`] thrown when a precondition or a pool invariant does not
//!   hold.
//! - [`NotFound`] thrown when a compliance record, route or pool is missing.
//! - [`InsufficientFunds`] thrown when more banked surplus is requested than
//!   is available.
//! - [`Timeout`] thrown when the store did not answer in time. Nothing was
//!   committed, so the call is safe to retry.
//! - [`PartialFailure`] thrown when a step of an atomic operation observed
//!   state diverging from what an earlier step read. The transaction is rolled
//!   back before the error is returned.
//!
//!  [`InvalidInput`]: EngineError::InvalidInput
//!  [`Validation`]: EngineError::Validation
//!  [`NotFound`]: EngineError::NotFound
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`Timeout`]: EngineError::Timeout
//!  [`PartialFailure`]: EngineError::PartialFailure
use sea_orm::{ConnAcquireErr, DbErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Store timeout: {0}")]
    Timeout(String),
    #[error("Partial failure: {0}")]
    PartialFailure(String),
    #[error(transparent)]
    Database(DbErr),
}

impl From<DbErr> for EngineError {
    fn from(value: DbErr) -> Self {
        match value {
            DbErr::ConnectionAcquire(ConnAcquireErr::Timeout) => {
                Self::Timeout("no store connection available".to_string())
            }
            other => Self::Database(other),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::Timeout(a), Self::Timeout(b)) => a == b,
            (Self::PartialFailure(a), Self::PartialFailure(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_timeout_maps_to_timeout() {
        let err = EngineError::from(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout));
        assert!(matches!(err, EngineError::Timeout(_)));
    }

    #[test]
    fn other_db_errors_stay_database() {
        let err = EngineError::from(DbErr::Custom("boom".to_string()));
        assert_eq!(err, EngineError::Database(DbErr::Custom("boom".to_string())));
    }
}
