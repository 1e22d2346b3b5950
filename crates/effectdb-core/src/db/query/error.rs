use crate::{
    db::{cursor::CursorDecodeError, key::KeyError, store::StoreError},
    error::{ErrorClass, ErrorOrigin},
};
use derive_more::Display;
use thiserror::Error as ThisError;

///
/// LookupEntity
///
/// Foreign entity a filter resolves before it can narrow the query.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum LookupEntity {
    #[display("account")]
    Account,
    #[display("ledger")]
    Ledger,
    #[display("transaction")]
    Transaction,
    #[display("liquidity pool")]
    LiquidityPool,
}

///
/// QueryError
///
/// First failure latched by a query builder. `NotFound` and
/// `LookupFailed` are kept apart so callers can tell a missing entity from a
/// storage fault during resolution.
///

#[derive(Debug, ThisError)]
pub enum QueryError {
    #[error("invalid paging order: {0}")]
    InvalidOrder(String),

    #[error("malformed cursor: {0}")]
    MalformedCursor(#[from] CursorDecodeError),

    #[error("invalid limit {limit}: must be between 1 and {max}")]
    InvalidLimit { limit: u64, max: u64 },

    #[error("{entity} '{key}' not found")]
    NotFound { entity: LookupEntity, key: String },

    #[error("{entity} lookup for '{key}' failed: {source}")]
    LookupFailed {
        entity: LookupEntity,
        key: String,
        source: StoreError,
    },

    #[error("invalid operation key: {0}")]
    Key(#[from] KeyError),

    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        source: StoreError,
    },
}

impl QueryError {
    pub(crate) fn storage(context: &'static str, source: StoreError) -> Self {
        Self::Storage { context, source }
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidOrder(_)
            | Self::MalformedCursor(_)
            | Self::InvalidLimit { .. }
            | Self::Key(_) => ErrorClass::InvalidInput,
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::LookupFailed { source, .. } | Self::Storage { source, .. } => source.class(),
        }
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self {
            Self::MalformedCursor(_) => ErrorOrigin::Cursor,
            Self::InvalidOrder(_) | Self::InvalidLimit { .. } | Self::Key(_) => ErrorOrigin::Query,
            Self::NotFound { .. } | Self::LookupFailed { .. } => ErrorOrigin::Lookup,
            Self::Storage { .. } => ErrorOrigin::Store,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
