//! Storage port.
//!
//! The engine composes queries; a backend runs them. Every method takes the
//! request's `ExecContext`, and a backend must serve all calls made through
//! one handle from the same snapshot, so resolutions and the final query see
//! consistent foreign keys.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::{MemorySnapshot, MemoryStore, SnapshotStats};

use crate::db::{context::ExecContext, effect::Effect, query::spec::QuerySpec};

///
/// AccountRow
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountRow {
    pub id: i64,
    pub address: String,
}

///
/// LedgerRow
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LedgerRow {
    pub id: i64,
    pub sequence: i32,
}

///
/// TransactionRow
///
/// `id` is the transaction's composite operation key (operation order 0).
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransactionRow {
    pub id: i64,
    pub hash: String,
}

///
/// LiquidityPoolRow
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LiquidityPoolRow {
    pub id: i64,
    pub pool_id: String,
}

///
/// EffectStore
///
/// Read-only storage capability required by the effects query engine.
/// Lookups return `Ok(None)` when the entity does not exist and reserve
/// `Err` for storage faults.
///

pub trait EffectStore {
    fn account_by_address(
        &self,
        ctx: &ExecContext,
        address: &str,
    ) -> Result<Option<AccountRow>, StoreError>;

    fn ledger_by_sequence(
        &self,
        ctx: &ExecContext,
        sequence: i32,
    ) -> Result<Option<LedgerRow>, StoreError>;

    fn transaction_by_hash(
        &self,
        ctx: &ExecContext,
        hash: &str,
    ) -> Result<Option<TransactionRow>, StoreError>;

    fn liquidity_pool_by_id(
        &self,
        ctx: &ExecContext,
        pool_id: &str,
    ) -> Result<Option<LiquidityPoolRow>, StoreError>;

    /// Run a spec over the operation/liquidity-pool join table.
    fn select_operation_ids(
        &self,
        ctx: &ExecContext,
        spec: &QuerySpec,
    ) -> Result<Vec<i64>, StoreError>;

    /// Run a spec over the effects table.
    fn select_effects(&self, ctx: &ExecContext, spec: &QuerySpec)
    -> Result<Vec<Effect>, StoreError>;
}
