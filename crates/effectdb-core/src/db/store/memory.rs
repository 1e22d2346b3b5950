//! In-memory reference backend.
//!
//! Effects live in a B-tree keyed by `(operation_id, order)`, mirroring the
//! composite index a relational backend keeps. Reads go through an
//! immutable `MemorySnapshot`; later writes to the store never show up in a
//! snapshot already handed out.

use crate::{
    db::{
        access::{AccessPlan, PlanKind, equality_on, plan_access},
        context::ExecContext,
        direction::Direction,
        effect::{Effect, EffectRow},
        key::{KeyError, OperationKey},
        predicate::{Column, ColumnSource, Predicate},
        query::spec::{OrderTerm, QuerySpec, Source},
        store::{
            AccountRow, EffectStore, LedgerRow, LiquidityPoolRow, StoreError, TransactionRow,
        },
    },
    obs::sink::{MetricsEvent, record},
};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet, HashMap},
    ops::Bound,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering as AtomicOrdering},
    },
};

const EFFECT_INDEX: &[Column] = &[Column::EffectOperationId, Column::EffectOrder];
const POOL_OPERATION_INDEX: &[Column] = &[Column::PoolOperationId];

///
/// MemoryState
///

#[derive(Clone, Debug, Default)]
struct MemoryState {
    effects: BTreeMap<(i64, i32), EffectRow>,
    accounts: BTreeMap<i64, String>,
    account_ids: HashMap<String, i64>,
    ledgers: BTreeMap<i32, LedgerRow>,
    transactions: HashMap<String, TransactionRow>,
    pools: HashMap<String, LiquidityPoolRow>,
    pool_operations: BTreeMap<i64, BTreeSet<i64>>,
}

///
/// MemoryStore
///
/// Writable fixture store. Writes are copy-on-write against outstanding
/// snapshots.
///

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    state: Arc<MemoryState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&mut self) -> &mut MemoryState {
        Arc::make_mut(&mut self.state)
    }

    /// Register an account address, returning its internal id.
    pub fn insert_account(&mut self, address: &str) -> i64 {
        let state = self.state_mut();
        if let Some(id) = state.account_ids.get(address) {
            return *id;
        }

        let id = state.accounts.keys().next_back().map_or(1, |last| last + 1);
        state.accounts.insert(id, address.to_string());
        state.account_ids.insert(address.to_string(), id);

        id
    }

    pub fn insert_ledger(&mut self, sequence: i32) -> Result<LedgerRow, KeyError> {
        let row = LedgerRow {
            id: OperationKey::ledger_start(sequence)?.to_i64(),
            sequence,
        };
        self.state_mut().ledgers.insert(sequence, row.clone());

        Ok(row)
    }

    pub fn insert_transaction(
        &mut self,
        hash: &str,
        ledger_sequence: i32,
        transaction_order: i32,
    ) -> Result<TransactionRow, KeyError> {
        let row = TransactionRow {
            id: OperationKey::new(ledger_sequence, transaction_order, 0)?.to_i64(),
            hash: hash.to_string(),
        };
        self.state_mut()
            .transactions
            .insert(hash.to_string(), row.clone());

        Ok(row)
    }

    /// Register a liquidity pool, returning its internal id.
    pub fn insert_liquidity_pool(&mut self, pool_id: &str) -> i64 {
        let state = self.state_mut();
        if let Some(row) = state.pools.get(pool_id) {
            return row.id;
        }

        let id = i64::try_from(state.pools.len()).map_or(i64::MAX, |len| len + 1);
        state.pools.insert(
            pool_id.to_string(),
            LiquidityPoolRow {
                id,
                pool_id: pool_id.to_string(),
            },
        );

        id
    }

    /// Record that an operation touched a liquidity pool.
    pub fn link_operation_pool(&mut self, pool: i64, operation_id: i64) {
        self.state_mut()
            .pool_operations
            .entry(pool)
            .or_default()
            .insert(operation_id);
    }

    pub fn insert_effect(&mut self, row: EffectRow) {
        self.state_mut()
            .effects
            .insert((row.operation_id, row.order), row);
    }

    /// Freeze the current state for one request.
    #[must_use]
    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            state: Arc::clone(&self.state),
            stats: Arc::new(SnapshotStats::default()),
        }
    }
}

///
/// SnapshotStats
///
/// Call counters for one snapshot, shared by its clones.
///

#[derive(Debug, Default)]
pub struct SnapshotStats {
    lookup_calls: AtomicU64,
    select_calls: AtomicU64,
    rows_scanned: AtomicU64,
}

impl SnapshotStats {
    #[must_use]
    pub fn lookup_calls(&self) -> u64 {
        self.lookup_calls.load(AtomicOrdering::Relaxed)
    }

    #[must_use]
    pub fn select_calls(&self) -> u64 {
        self.select_calls.load(AtomicOrdering::Relaxed)
    }

    #[must_use]
    pub fn rows_scanned(&self) -> u64 {
        self.rows_scanned.load(AtomicOrdering::Relaxed)
    }

    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, AtomicOrdering::Relaxed);
    }
}

///
/// MemorySnapshot
///

#[derive(Clone, Debug)]
pub struct MemorySnapshot {
    state: Arc<MemoryState>,
    stats: Arc<SnapshotStats>,
}

impl MemorySnapshot {
    #[must_use]
    pub fn stats(&self) -> &SnapshotStats {
        &self.stats
    }

    fn begin_lookup(&self, ctx: &ExecContext) -> Result<(), StoreError> {
        ctx.check()?;
        SnapshotStats::bump(&self.stats.lookup_calls, 1);

        Ok(())
    }

    fn begin_select(
        &self,
        ctx: &ExecContext,
        spec: &QuerySpec,
        expected: Source,
    ) -> Result<(), StoreError> {
        ctx.check()?;
        SnapshotStats::bump(&self.stats.select_calls, 1);

        if spec.source() != expected {
            return Err(StoreError::Internal(format!(
                "spec reads {:?}, expected {expected:?}",
                spec.source()
            )));
        }

        Ok(())
    }

    fn effect_candidates<'a>(
        &'a self,
        plan: &'a AccessPlan,
    ) -> Box<dyn DoubleEndedIterator<Item = &'a EffectRow> + 'a> {
        let effects = &self.state.effects;

        match plan {
            AccessPlan::Empty => Box::new(std::iter::empty()),
            AccessPlan::FullScan => Box::new(effects.values()),
            AccessPlan::Keys(keys) => Box::new(
                keys.iter()
                    .flat_map(move |key| effects.range((*key, i32::MIN)..=(*key, i32::MAX)))
                    .map(|(_, row)| row),
            ),
            AccessPlan::Range { lower, upper } => {
                let lower = match *lower {
                    Bound::Included(v) => Bound::Included((v, i32::MIN)),
                    Bound::Excluded(v) => Bound::Excluded((v, i32::MAX)),
                    Bound::Unbounded => Bound::Unbounded,
                };
                let upper = match *upper {
                    Bound::Included(v) => Bound::Included((v, i32::MAX)),
                    Bound::Excluded(v) => Bound::Excluded((v, i32::MIN)),
                    Bound::Unbounded => Bound::Unbounded,
                };

                Box::new(effects.range((lower, upper)).map(|(_, row)| row))
            }
        }
    }
}

impl EffectStore for MemorySnapshot {
    fn account_by_address(
        &self,
        ctx: &ExecContext,
        address: &str,
    ) -> Result<Option<AccountRow>, StoreError> {
        self.begin_lookup(ctx)?;

        Ok(self
            .state
            .account_ids
            .get(address)
            .map(|id| AccountRow {
                id: *id,
                address: address.to_string(),
            }))
    }

    fn ledger_by_sequence(
        &self,
        ctx: &ExecContext,
        sequence: i32,
    ) -> Result<Option<LedgerRow>, StoreError> {
        self.begin_lookup(ctx)?;

        Ok(self.state.ledgers.get(&sequence).cloned())
    }

    fn transaction_by_hash(
        &self,
        ctx: &ExecContext,
        hash: &str,
    ) -> Result<Option<TransactionRow>, StoreError> {
        self.begin_lookup(ctx)?;

        Ok(self.state.transactions.get(hash).cloned())
    }

    fn liquidity_pool_by_id(
        &self,
        ctx: &ExecContext,
        pool_id: &str,
    ) -> Result<Option<LiquidityPoolRow>, StoreError> {
        self.begin_lookup(ctx)?;

        Ok(self.state.pools.get(pool_id).cloned())
    }

    fn select_operation_ids(
        &self,
        ctx: &ExecContext,
        spec: &QuerySpec,
    ) -> Result<Vec<i64>, StoreError> {
        self.begin_select(ctx, spec, Source::OperationLiquidityPools)?;

        // Index is (pool, operation): seek one pool's range when the query pins a pool.
        let rows: Vec<PoolOperationRow> = match equality_on(spec, Column::PoolInternalId) {
            Some(pool) => {
                let plan = plan_access(spec);
                record(MetricsEvent::Plan { kind: plan.kind() });

                let operations = self.state.pool_operations.get(&pool);
                pool_candidates(operations, &plan)
                    .map(|operation_id| PoolOperationRow { pool, operation_id })
                    .collect()
            }
            None => {
                record(MetricsEvent::Plan {
                    kind: PlanKind::FullScan,
                });

                let mut rows: Vec<_> = self
                    .state
                    .pool_operations
                    .iter()
                    .flat_map(|(pool, ops)| {
                        ops.iter().map(|operation_id| PoolOperationRow {
                            pool: *pool,
                            operation_id: *operation_id,
                        })
                    })
                    .collect();
                rows.sort_by_key(|row| (row.operation_id, row.pool));
                rows
            }
        };

        let selected = select_ordered(rows.into_iter(), spec, POOL_OPERATION_INDEX, &self.stats);

        Ok(selected.into_iter().map(|row| row.operation_id).collect())
    }

    fn select_effects(
        &self,
        ctx: &ExecContext,
        spec: &QuerySpec,
    ) -> Result<Vec<Effect>, StoreError> {
        self.begin_select(ctx, spec, Source::Effects)?;

        let plan = plan_access(spec);
        record(MetricsEvent::Plan { kind: plan.kind() });

        let selected = select_ordered(
            self.effect_candidates(&plan),
            spec,
            EFFECT_INDEX,
            &self.stats,
        );

        Ok(selected
            .into_iter()
            .map(|row| {
                let address = self.state.accounts.get(&row.account_id).cloned();
                Effect::from_row(row.clone(), address)
            })
            .collect())
    }
}

///
/// PoolOperationRow
///

#[derive(Clone, Copy, Debug)]
struct PoolOperationRow {
    pool: i64,
    operation_id: i64,
}

impl ColumnSource for PoolOperationRow {
    fn column(&self, column: Column) -> Option<i64> {
        match column {
            Column::PoolInternalId => Some(self.pool),
            Column::PoolOperationId => Some(self.operation_id),
            _ => None,
        }
    }
}

fn pool_candidates<'a>(
    operations: Option<&'a BTreeSet<i64>>,
    plan: &'a AccessPlan,
) -> Box<dyn Iterator<Item = i64> + 'a> {
    let Some(operations) = operations else {
        return Box::new(std::iter::empty());
    };

    match plan {
        AccessPlan::Empty => Box::new(std::iter::empty()),
        AccessPlan::FullScan => Box::new(operations.iter().copied()),
        AccessPlan::Keys(keys) => Box::new(keys.intersection(operations).copied()),
        AccessPlan::Range { lower, upper } => {
            Box::new(operations.range((*lower, *upper)).copied())
        }
    }
}

// Filter, order and limit candidates already in index order. When the
// requested ordering is a prefix of the index the scan streams and stops at
// the limit; otherwise every match is collected and sorted.
fn select_ordered<R, I>(
    candidates: I,
    spec: &QuerySpec,
    index: &[Column],
    stats: &SnapshotStats,
) -> Vec<R>
where
    R: ColumnSource,
    I: DoubleEndedIterator<Item = R>,
{
    let predicate = spec.predicate();
    let limit = spec
        .limit_value()
        .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));

    let mut scanned = 0u64;
    let rows = match streaming_direction(spec.order(), index) {
        Some(Direction::Asc) => take_matching(candidates, &predicate, limit, &mut scanned),
        Some(Direction::Desc) => take_matching(candidates.rev(), &predicate, limit, &mut scanned),
        None => {
            let mut rows = take_matching(candidates, &predicate, usize::MAX, &mut scanned);
            rows.sort_by(|a, b| compare_rows(a, b, spec.order()));
            rows.truncate(limit);
            rows
        }
    };

    SnapshotStats::bump(&stats.rows_scanned, scanned);
    record(MetricsEvent::RowsScanned { rows: scanned });

    rows
}

fn take_matching<R: ColumnSource>(
    candidates: impl Iterator<Item = R>,
    predicate: &Predicate,
    limit: usize,
    scanned: &mut u64,
) -> Vec<R> {
    candidates
        .inspect(|_| *scanned += 1)
        .filter(|row| predicate.eval(row))
        .take(limit)
        .collect()
}

fn streaming_direction(order: &[OrderTerm], index: &[Column]) -> Option<Direction> {
    let Some(first) = order.first() else {
        return Some(Direction::Asc);
    };

    let prefix = order.len() <= index.len()
        && order
            .iter()
            .zip(index)
            .all(|(term, column)| term.column == *column && term.direction == first.direction);

    prefix.then_some(first.direction)
}

fn compare_rows(a: &impl ColumnSource, b: &impl ColumnSource, order: &[OrderTerm]) -> Ordering {
    for term in order {
        let ordering = a.column(term.column).cmp(&b.column(term.column));
        let ordering = match term.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}
