use crate::error::ErrorClass;
use thiserror::Error as ThisError;

///
/// StoreError
///
/// Failures raised by a storage backend. The engine wraps these with
/// context but never changes their kind.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage call cancelled")]
    Cancelled,

    #[error("store corruption: {0}")]
    Corrupt(String),

    #[error("store internal error: {0}")]
    Internal(String),
}

impl StoreError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Unavailable(_) => ErrorClass::Unavailable,
            Self::Cancelled => ErrorClass::Cancelled,
            Self::Corrupt(_) => ErrorClass::Corruption,
            Self::Internal(_) => ErrorClass::Internal,
        }
    }
}
