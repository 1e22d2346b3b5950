use derive_more::Display;
use effectdb_config::ConfigError;
use effectdb_core::{
    db::{QueryError, StoreError, effect::DetailsError},
    error::ErrorOrigin as CoreErrorOrigin,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Debug, Deserialize, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// True when retrying the same request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.kind, ErrorKind::Store(StoreErrorKind::Unavailable))
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        let origin = err.origin().into();
        let kind = match &err {
            QueryError::InvalidOrder(_) => ErrorKind::Query(QueryErrorKind::InvalidOrder),
            QueryError::MalformedCursor(_) => ErrorKind::Query(QueryErrorKind::MalformedCursor),
            QueryError::InvalidLimit { .. } => ErrorKind::Query(QueryErrorKind::InvalidLimit),
            QueryError::Key(_) => ErrorKind::Query(QueryErrorKind::InvalidKey),
            QueryError::NotFound { .. } => ErrorKind::Query(QueryErrorKind::NotFound),
            QueryError::LookupFailed { source, .. } | QueryError::Storage { source, .. } => {
                store_kind(source)
            }
        };

        Self::new(kind, origin, err.to_string())
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self::new(store_kind(&err), ErrorOrigin::Store, err.to_string())
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config, ErrorOrigin::Config, err.to_string())
    }
}

impl From<DetailsError> for Error {
    fn from(err: DetailsError) -> Self {
        Self::new(ErrorKind::Details, ErrorOrigin::Details, err.to_string())
    }
}

const fn store_kind(err: &StoreError) -> ErrorKind {
    match err {
        StoreError::Unavailable(_) => ErrorKind::Store(StoreErrorKind::Unavailable),
        StoreError::Cancelled => ErrorKind::Store(StoreErrorKind::Cancelled),
        StoreError::Corrupt(_) => ErrorKind::Store(StoreErrorKind::Corrupt),
        StoreError::Internal(_) => ErrorKind::Internal,
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers and API layers.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    Query(QueryErrorKind),
    Store(StoreErrorKind),

    /// Paging configuration failed to load or validate.
    Config,

    /// A stored effect payload could not be decoded.
    Details,

    /// The caller cannot remediate this.
    Internal,
}

///
/// QueryErrorKind
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum QueryErrorKind {
    /// Direction other than `asc` or `desc`.
    InvalidOrder,

    /// Paging token is not two non-negative integers.
    MalformedCursor,

    InvalidLimit,

    /// Operation or ledger key outside the composite key space.
    InvalidKey,

    /// A filter's account, ledger, transaction or pool does not exist.
    NotFound,
}

///
/// StoreErrorKind
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum StoreErrorKind {
    Unavailable,
    Cancelled,
    Corrupt,
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers and API layers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Config,
    Cursor,
    Details,
    Lookup,
    Query,
    Store,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Cursor => Self::Cursor,
            CoreErrorOrigin::Query => Self::Query,
            CoreErrorOrigin::Lookup => Self::Lookup,
            CoreErrorOrigin::Store => Self::Store,
        }
    }
}

///
/// TESTS
///
