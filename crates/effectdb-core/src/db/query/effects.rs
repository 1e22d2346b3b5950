//! Effects query builder.
//!
//! Each chained call consumes the builder and returns the next state, which
//! holds either the advanced `QuerySpec` or the first failure. Once failed,
//! later calls pass the error through without touching storage, and
//! `execute` returns it without issuing the main query.

use crate::{
    db::{
        context::ExecContext,
        effect::Effect,
        keyset::{EFFECT_KEYSET, POOL_OPERATION_KEYSET, apply_keyset},
        page::PageQuery,
        predicate::{Column, Predicate},
        query::{
            error::{LookupEntity, QueryError},
            filter::{account_predicate, ledger_range, operation_range, transaction_range},
            spec::QuerySpec,
        },
        store::{EffectStore, StoreError},
    },
    obs::sink::{FilterKind, MetricsEvent, record},
};
use std::fmt::Display;
use tracing::{debug, warn};

///
/// EffectsQuery
///
/// Builder for one logical request over the effects table. Borrows the
/// store and the request context; a builder is never shared between
/// requests.
///

pub struct EffectsQuery<'a, S>
where
    S: EffectStore + ?Sized,
{
    store: &'a S,
    ctx: &'a ExecContext,
    state: Result<QuerySpec, QueryError>,
}

impl<'a, S> EffectsQuery<'a, S>
where
    S: EffectStore + ?Sized,
{
    #[must_use]
    pub fn new(store: &'a S, ctx: &'a ExecContext) -> Self {
        Self {
            store,
            ctx,
            state: Ok(QuerySpec::effects()),
        }
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Current spec, or the latched failure.
    pub fn spec(&self) -> Result<&QuerySpec, &QueryError> {
        self.state.as_ref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&QueryError> {
        self.state.as_ref().err()
    }

    /// SQL text of the composed query.
    pub fn explain(&self) -> Result<String, &QueryError> {
        self.spec().map(ToString::to_string)
    }

    pub fn into_spec(self) -> Result<QuerySpec, QueryError> {
        self.state
    }

    // Run one step against the current spec. A failure latches; an already
    // latched builder skips the step entirely.
    fn advance(
        self,
        filter: FilterKind,
        step: impl FnOnce(&'a S, &'a ExecContext, QuerySpec) -> Result<QuerySpec, QueryError>,
    ) -> Self {
        let Self { store, ctx, state } = self;

        let state = match state {
            Ok(spec) => match step(store, ctx, spec) {
                Ok(spec) => {
                    record(MetricsEvent::FilterApplied { filter });
                    Ok(spec)
                }
                Err(err) => {
                    record(MetricsEvent::Latched { class: err.class() });
                    debug!(?filter, class = %err.class(), error = %err, "effects query latched");
                    Err(err)
                }
            },
            Err(err) => Err(err),
        };

        Self { store, ctx, state }
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    /// Effects owned by the account with this address.
    #[must_use]
    pub fn for_account(self, address: &str) -> Self {
        self.advance(FilterKind::Account, |store, ctx, spec| {
            let account = resolve(
                LookupEntity::Account,
                address,
                store.account_by_address(ctx, address),
            )?;
            debug!(address, account_id = account.id, "account filter resolved");

            Ok(spec.filter(account_predicate(account.id)))
        })
    }

    /// Effects of every operation in ledger `sequence`.
    #[must_use]
    pub fn for_ledger(self, sequence: i32) -> Self {
        self.advance(FilterKind::Ledger, |store, ctx, spec| {
            let ledger = resolve(
                LookupEntity::Ledger,
                sequence,
                store.ledger_by_sequence(ctx, sequence),
            )?;
            let range = ledger_range(ledger.sequence)?;
            debug!(sequence, start = range.start, end = ?range.end, "ledger filter resolved");

            Ok(spec.filter(range.predicate(Column::EffectOperationId)))
        })
    }

    /// Effects of exactly one operation.
    #[must_use]
    pub fn for_operation(self, operation_id: i64) -> Self {
        self.advance(FilterKind::Operation, |_, _, spec| {
            let range = operation_range(operation_id)?;

            Ok(spec.filter(range.predicate(Column::EffectOperationId)))
        })
    }

    /// Effects of every operation in the transaction with this hash.
    #[must_use]
    pub fn for_transaction(self, hash: &str) -> Self {
        self.advance(FilterKind::Transaction, |store, ctx, spec| {
            let transaction = resolve(
                LookupEntity::Transaction,
                hash,
                store.transaction_by_hash(ctx, hash),
            )?;
            let range = transaction_range(transaction.id)?;
            debug!(hash, start = range.start, end = ?range.end, "transaction filter resolved");

            Ok(spec.filter(range.predicate(Column::EffectOperationId)))
        })
    }

    /// Effects of operations that touched a liquidity pool.
    ///
    /// The operation ids come from a keyset walk over the
    /// operation/liquidity-pool table that reuses `page`'s cursor, direction
    /// and limit. The walk is inclusive on the cursor's operation id so the
    /// operation a cursor points into is still found.
    #[must_use]
    pub fn for_liquidity_pool(self, page: &PageQuery, pool_id: &str) -> Self {
        self.advance(FilterKind::LiquidityPool, |store, ctx, spec| {
            let direction = page.direction()?;
            let cursor = page.cursor()?;
            let pool = resolve(
                LookupEntity::LiquidityPool,
                pool_id,
                store.liquidity_pool_by_id(ctx, pool_id),
            )?;

            let operations = apply_keyset(
                QuerySpec::operation_liquidity_pools()
                    .filter(Predicate::eq(Column::PoolInternalId, pool.id)),
                POOL_OPERATION_KEYSET,
                cursor,
                direction,
                page.limit(),
            );
            let operation_ids = store
                .select_operation_ids(ctx, &operations)
                .map_err(|source| storage_failure("select liquidity pool operations", source))?;
            debug!(
                pool_id,
                operations = operation_ids.len(),
                "liquidity pool filter resolved"
            );

            Ok(spec.filter(Predicate::in_(Column::EffectOperationId, operation_ids)))
        })
    }

    // ------------------------------------------------------------------
    // Pagination
    // ------------------------------------------------------------------

    /// Resume after the page's cursor in its direction, bounded by its limit.
    #[must_use]
    pub fn page(self, page: &PageQuery) -> Self {
        self.advance(FilterKind::Page, |_, _, spec| {
            let direction = page.direction()?;
            let cursor = page.cursor()?;
            let limit = page.checked_limit()?;

            Ok(apply_keyset(spec, EFFECT_KEYSET, cursor, direction, limit))
        })
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    /// Run the composed query and append the rows to `dest`.
    ///
    /// A latched failure is returned as-is and storage is never called.
    pub fn execute(self, dest: &mut Vec<Effect>) -> Result<(), QueryError> {
        record(MetricsEvent::QueryStart);

        let spec = self.state?;
        debug!(sql = %spec, "executing effects query");

        let rows = self
            .store
            .select_effects(self.ctx, &spec)
            .map_err(|source| storage_failure("select effects", source))?;

        let rows_returned = u64::try_from(rows.len()).unwrap_or(u64::MAX);
        record(MetricsEvent::QueryFinish { rows_returned });
        dest.extend(rows);

        Ok(())
    }
}

// Missing rows are NotFound; a storage fault keeps its source.
fn resolve<T>(
    entity: LookupEntity,
    key: impl Display,
    found: Result<Option<T>, StoreError>,
) -> Result<T, QueryError> {
    match found {
        Ok(Some(row)) => Ok(row),
        Ok(None) => Err(QueryError::NotFound {
            entity,
            key: key.to_string(),
        }),
        Err(source) => {
            warn!(%entity, %key, error = %source, "lookup failed");
            Err(QueryError::LookupFailed {
                entity,
                key: key.to_string(),
                source,
            })
        }
    }
}

fn storage_failure(context: &'static str, source: StoreError) -> QueryError {
    warn!(context, error = %source, "storage call failed");
    QueryError::storage(context, source)
}
