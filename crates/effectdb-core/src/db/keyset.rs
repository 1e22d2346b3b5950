//! Keyset pagination.
//!
//! Resumes a scan strictly after (or before) a cursor in the
//! `(major, minor)` total order. The predicate keeps a redundant leading
//! `>=` / `<=` on the major column: without it the condition is a bare OR
//! and planners fall back to a full scan instead of seeking the index.
//! Check plan output (`db::access`, or EXPLAIN on a relational backend)
//! before changing the shape below.

use crate::db::{
    cursor::Cursor,
    direction::Direction,
    predicate::{Column, Predicate},
    query::spec::QuerySpec,
};

///
/// KeysetColumns
///
/// Index columns a keyset walks. Without a minor column the walk is
/// inclusive on the major key, since a cursor inside an operation must
/// still see that operation.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeysetColumns {
    pub major: Column,
    pub minor: Option<Column>,
}

/// `(history_operation_id, order)` on the effects table.
pub const EFFECT_KEYSET: KeysetColumns = KeysetColumns {
    major: Column::EffectOperationId,
    minor: Some(Column::EffectOrder),
};

/// `history_operation_id` on the operation/liquidity-pool join table.
pub const POOL_OPERATION_KEYSET: KeysetColumns = KeysetColumns {
    major: Column::PoolOperationId,
    minor: None,
};

/// Build the resume predicate for one cursor and direction.
#[must_use]
pub fn keyset_predicate(columns: KeysetColumns, cursor: Cursor, direction: Direction) -> Predicate {
    let Cursor { major, minor } = cursor;

    let Some(minor_column) = columns.minor else {
        return match direction {
            Direction::Asc => Predicate::gte(columns.major, major),
            Direction::Desc => Predicate::lte(columns.major, major),
        };
    };

    match direction {
        Direction::Asc => Predicate::and(vec![
            Predicate::gte(columns.major, major),
            Predicate::or(vec![
                Predicate::gt(columns.major, major),
                Predicate::and(vec![
                    Predicate::eq(columns.major, major),
                    Predicate::gt(minor_column, minor),
                ]),
            ]),
        ]),
        Direction::Desc => Predicate::and(vec![
            Predicate::lte(columns.major, major),
            Predicate::or(vec![
                Predicate::lt(columns.major, major),
                Predicate::and(vec![
                    Predicate::eq(columns.major, major),
                    Predicate::lt(minor_column, minor),
                ]),
            ]),
        ]),
    }
}

/// Append the resume predicate, matching ordering, and limit to a spec.
#[must_use]
pub fn apply_keyset(
    spec: QuerySpec,
    columns: KeysetColumns,
    cursor: Cursor,
    direction: Direction,
    limit: u64,
) -> QuerySpec {
    let spec = spec
        .filter(keyset_predicate(columns, cursor, direction))
        .order_by(columns.major, direction);

    let spec = match columns.minor {
        Some(minor) => spec.order_by(minor, direction),
        None => spec,
    };

    spec.limit(limit)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::access::{AccessPlan, plan_access};
    use std::ops::Bound;

    #[test]
    fn ascending_page_renders_index_friendly_sql() {
        let spec = apply_keyset(
            QuerySpec::effects(),
            EFFECT_KEYSET,
            Cursor::new(42, 1),
            Direction::Asc,
            10,
        );

        assert_eq!(
            spec.to_string(),
            "SELECT heff.*, hacc.address FROM history_effects heff \
             LEFT JOIN history_accounts hacc ON hacc.id = heff.history_account_id \
             WHERE (heff.history_operation_id >= 42 AND (heff.history_operation_id > 42 \
             OR (heff.history_operation_id = 42 AND heff.\"order\" > 1))) \
             ORDER BY heff.history_operation_id asc, heff.\"order\" asc LIMIT 10"
        );
    }

    #[test]
    fn descending_page_mirrors_ascending_shape() {
        let spec = apply_keyset(
            QuerySpec::effects(),
            EFFECT_KEYSET,
            Cursor::new(42, 1),
            Direction::Desc,
            5,
        );

        assert_eq!(
            spec.predicates()[0].to_string(),
            "(heff.history_operation_id <= 42 AND (heff.history_operation_id < 42 \
             OR (heff.history_operation_id = 42 AND heff.\"order\" < 1)))"
        );
        assert!(spec.to_string().ends_with(
            "ORDER BY heff.history_operation_id desc, heff.\"order\" desc LIMIT 5"
        ));
    }

    #[test]
    fn keyset_predicate_plans_as_range_scan() {
        let spec = apply_keyset(
            QuerySpec::effects(),
            EFFECT_KEYSET,
            Cursor::new(42, 1),
            Direction::Asc,
            10,
        );

        assert_eq!(
            plan_access(&spec),
            AccessPlan::Range {
                lower: Bound::Included(42),
                upper: Bound::Unbounded,
            }
        );
    }

    #[test]
    fn or_only_resume_predicate_degrades_to_full_scan() {
        // The same condition without the leading `>=` seek bound.
        let spec = QuerySpec::effects().filter(Predicate::or(vec![
            Predicate::gt(Column::EffectOperationId, 42),
            Predicate::and(vec![
                Predicate::eq(Column::EffectOperationId, 42),
                Predicate::gt(Column::EffectOrder, 1),
            ]),
        ]));

        assert_eq!(plan_access(&spec), AccessPlan::FullScan);
    }

    #[test]
    fn operation_only_keyset_is_inclusive() {
        let spec = apply_keyset(
            QuerySpec::operation_liquidity_pools(),
            POOL_OPERATION_KEYSET,
            Cursor::new(99, 3),
            Direction::Desc,
            4,
        );

        assert_eq!(
            spec.to_string(),
            "SELECT holp.history_operation_id FROM history_operation_liquidity_pools holp \
             WHERE holp.history_operation_id <= 99 \
             ORDER BY holp.history_operation_id desc LIMIT 4"
        );
    }
}
