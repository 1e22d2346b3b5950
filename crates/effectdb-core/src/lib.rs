//! Core of EffectDB: keyset pagination and filter composition over an
//! append-only log of ledger effects.
//!
//! Queries are composed as plain `QuerySpec` values and run by an
//! `EffectStore` backend. `MemoryStore` is the in-process reference backend.

// public exports are one module level down
pub mod db;
pub mod error;
pub mod obs;

///
/// Prelude
///
/// Domain vocabulary only. Errors and store internals stay under `db`.
///

pub mod prelude {
    pub use crate::db::{
        Cursor, DbSession, Direction, Effect, EffectType, ExecContext, OperationKey, PageQuery,
    };
}
