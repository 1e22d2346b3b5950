//! Access-path derivation.
//!
//! Only top-level conjuncts on the source's leading index column narrow the
//! scan. Everything else stays a residual filter evaluated per row, so a
//! predicate whose leading-column condition sits under an OR cannot seek.

use crate::db::{
    predicate::{Column, CompareOp, Predicate},
    query::spec::QuerySpec,
};
use std::{collections::BTreeSet, ops::Bound};

///
/// AccessPlan
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AccessPlan {
    /// Nothing can match.
    Empty,
    /// Point lookups on the leading column.
    Keys(BTreeSet<i64>),
    /// Contiguous range on the leading column.
    Range { lower: Bound<i64>, upper: Bound<i64> },
    FullScan,
}

impl AccessPlan {
    #[must_use]
    pub const fn kind(&self) -> PlanKind {
        match self {
            Self::Empty | Self::Keys(_) => PlanKind::Keys,
            Self::Range { .. } => PlanKind::Range,
            Self::FullScan => PlanKind::FullScan,
        }
    }
}

///
/// PlanKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlanKind {
    Keys,
    Range,
    FullScan,
}

/// Derive the access path for a spec against its source's leading column.
#[must_use]
pub fn plan_access(spec: &QuerySpec) -> AccessPlan {
    let leading = spec.source().leading_column();

    let mut conjuncts = Vec::new();
    for predicate in spec.predicates() {
        flatten_and(predicate, &mut conjuncts);
    }

    let mut lower = Bound::Unbounded;
    let mut upper = Bound::Unbounded;
    let mut keys: Option<BTreeSet<i64>> = None;

    for conjunct in conjuncts {
        match conjunct {
            Predicate::False => return AccessPlan::Empty,
            Predicate::Compare { column, op, value } if *column == leading => {
                let (lo, hi) = compare_bounds(*op, *value);
                lower = tighter_lower(lower, lo);
                upper = tighter_upper(upper, hi);
            }
            Predicate::In { column, values } if *column == leading => {
                let set: BTreeSet<i64> = values.iter().copied().collect();
                keys = Some(match keys {
                    Some(existing) => existing.intersection(&set).copied().collect(),
                    None => set,
                });
            }
            _ => {}
        }
    }

    if let Some(keys) = keys {
        let keys: BTreeSet<i64> = keys
            .into_iter()
            .filter(|key| within(*key, lower, upper))
            .collect();

        return if keys.is_empty() {
            AccessPlan::Empty
        } else {
            AccessPlan::Keys(keys)
        };
    }

    if matches!((lower, upper), (Bound::Unbounded, Bound::Unbounded)) {
        return AccessPlan::FullScan;
    }
    if range_is_empty(lower, upper) {
        return AccessPlan::Empty;
    }

    AccessPlan::Range { lower, upper }
}

/// Find a top-level `column = value` conjunct.
#[must_use]
pub fn equality_on(spec: &QuerySpec, column: Column) -> Option<i64> {
    let mut conjuncts = Vec::new();
    for predicate in spec.predicates() {
        flatten_and(predicate, &mut conjuncts);
    }

    conjuncts.into_iter().find_map(|conjunct| match conjunct {
        Predicate::Compare {
            column: c,
            op: CompareOp::Eq,
            value,
        } if *c == column => Some(*value),
        _ => None,
    })
}

fn flatten_and<'a>(predicate: &'a Predicate, out: &mut Vec<&'a Predicate>) {
    match predicate {
        Predicate::And(preds) => {
            for pred in preds {
                flatten_and(pred, out);
            }
        }
        other => out.push(other),
    }
}

const fn compare_bounds(op: CompareOp, value: i64) -> (Bound<i64>, Bound<i64>) {
    match op {
        CompareOp::Eq => (Bound::Included(value), Bound::Included(value)),
        CompareOp::Lt => (Bound::Unbounded, Bound::Excluded(value)),
        CompareOp::Lte => (Bound::Unbounded, Bound::Included(value)),
        CompareOp::Gt => (Bound::Excluded(value), Bound::Unbounded),
        CompareOp::Gte => (Bound::Included(value), Bound::Unbounded),
    }
}

const fn bound_value(bound: Bound<i64>) -> Option<i64> {
    match bound {
        Bound::Included(value) | Bound::Excluded(value) => Some(value),
        Bound::Unbounded => None,
    }
}

fn tighter_lower(current: Bound<i64>, candidate: Bound<i64>) -> Bound<i64> {
    match (bound_value(current), bound_value(candidate)) {
        (None, _) => candidate,
        (_, None) => current,
        (Some(a), Some(b)) if a > b => current,
        (Some(a), Some(b)) if a < b => candidate,
        // equal values: the exclusive bound is tighter
        _ if matches!(candidate, Bound::Excluded(_)) => candidate,
        _ => current,
    }
}

fn tighter_upper(current: Bound<i64>, candidate: Bound<i64>) -> Bound<i64> {
    match (bound_value(current), bound_value(candidate)) {
        (None, _) => candidate,
        (_, None) => current,
        (Some(a), Some(b)) if a < b => current,
        (Some(a), Some(b)) if a > b => candidate,
        _ if matches!(candidate, Bound::Excluded(_)) => candidate,
        _ => current,
    }
}

const fn within(key: i64, lower: Bound<i64>, upper: Bound<i64>) -> bool {
    let above = match lower {
        Bound::Included(lo) => key >= lo,
        Bound::Excluded(lo) => key > lo,
        Bound::Unbounded => true,
    };
    let below = match upper {
        Bound::Included(hi) => key <= hi,
        Bound::Excluded(hi) => key < hi,
        Bound::Unbounded => true,
    };

    above && below
}

const fn range_is_empty(lower: Bound<i64>, upper: Bound<i64>) -> bool {
    match (lower, upper) {
        (Bound::Included(lo), Bound::Included(hi)) => lo > hi,
        (Bound::Included(lo) | Bound::Excluded(lo), Bound::Excluded(hi))
        | (Bound::Excluded(lo), Bound::Included(hi)) => lo >= hi,
        _ => false,
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_open_filter_plans_as_range() {
        let spec = QuerySpec::effects()
            .filter(Predicate::gte(Column::EffectOperationId, 100))
            .filter(Predicate::lt(Column::EffectOperationId, 200));

        assert_eq!(
            plan_access(&spec),
            AccessPlan::Range {
                lower: Bound::Included(100),
                upper: Bound::Excluded(200),
            }
        );
    }

    #[test]
    fn nested_conjunctions_still_narrow() {
        let spec = QuerySpec::effects().filter(Predicate::and(vec![
            Predicate::gt(Column::EffectOperationId, 5),
            Predicate::and(vec![Predicate::gte(Column::EffectOperationId, 5)]),
        ]));

        assert_eq!(
            plan_access(&spec),
            AccessPlan::Range {
                lower: Bound::Excluded(5),
                upper: Bound::Unbounded,
            }
        );
    }

    #[test]
    fn non_leading_columns_do_not_narrow() {
        let spec = QuerySpec::effects().filter(Predicate::eq(Column::EffectAccountId, 9));
        assert_eq!(plan_access(&spec), AccessPlan::FullScan);
    }

    #[test]
    fn membership_is_clipped_by_range() {
        let spec = QuerySpec::effects()
            .filter(Predicate::in_(Column::EffectOperationId, vec![1, 5, 9]))
            .filter(Predicate::gte(Column::EffectOperationId, 5));

        assert_eq!(plan_access(&spec), AccessPlan::Keys([5, 9].into()));
    }

    #[test]
    fn disjoint_bounds_plan_empty() {
        let spec = QuerySpec::effects()
            .filter(Predicate::gte(Column::EffectOperationId, 10))
            .filter(Predicate::lt(Column::EffectOperationId, 10));

        assert_eq!(plan_access(&spec), AccessPlan::Empty);
    }

    #[test]
    fn equality_lookup_finds_top_level_conjunct() {
        let spec = QuerySpec::operation_liquidity_pools()
            .filter(Predicate::eq(Column::PoolInternalId, 3))
            .filter(Predicate::gte(Column::PoolOperationId, 1));

        assert_eq!(equality_on(&spec, Column::PoolInternalId), Some(3));
        assert_eq!(equality_on(&spec, Column::EffectAccountId), None);
    }
}
