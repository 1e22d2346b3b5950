//! Predicate AST over the effect log tables.
//!
//! Predicates are plain values: building one never touches storage. The
//! same tree is evaluated row-by-row by in-process stores and rendered to
//! SQL text (`Display`) for relational backends and explain output.

use std::fmt;

///
/// Column
///
/// Closed vocabulary of the columns the engine filters and orders on.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Column {
    EffectOperationId,
    EffectOrder,
    EffectAccountId,
    EffectType,
    PoolOperationId,
    PoolInternalId,
}

impl Column {
    #[must_use]
    pub const fn sql_name(self) -> &'static str {
        match self {
            Self::EffectOperationId => "heff.history_operation_id",
            Self::EffectOrder => "heff.\"order\"",
            Self::EffectAccountId => "heff.history_account_id",
            Self::EffectType => "heff.type",
            Self::PoolOperationId => "holp.history_operation_id",
            Self::PoolInternalId => "holp.history_liquidity_pool_id",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

///
/// ColumnSource
///
/// Row-side accessor used by predicate evaluation.
/// Returns `None` for columns the row does not carry.
///

pub trait ColumnSource {
    fn column(&self, column: Column) -> Option<i64>;
}

impl<T: ColumnSource + ?Sized> ColumnSource for &T {
    fn column(&self, column: Column) -> Option<i64> {
        (**self).column(column)
    }
}

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }

    #[must_use]
    pub const fn holds(self, left: i64, right: i64) -> bool {
        match self {
            Self::Eq => left == right,
            Self::Lt => left < right,
            Self::Lte => left <= right,
            Self::Gt => left > right,
            Self::Gte => left >= right,
        }
    }
}

///
/// Predicate
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Predicate {
    False,
    Compare {
        column: Column,
        op: CompareOp,
        value: i64,
    },
    In {
        column: Column,
        values: Vec<i64>,
    },
    And(Vec<Self>),
    Or(Vec<Self>),
}

impl Predicate {
    #[must_use]
    pub const fn compare(column: Column, op: CompareOp, value: i64) -> Self {
        Self::Compare { column, op, value }
    }

    #[must_use]
    pub const fn eq(column: Column, value: i64) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    #[must_use]
    pub const fn lt(column: Column, value: i64) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    #[must_use]
    pub const fn lte(column: Column, value: i64) -> Self {
        Self::compare(column, CompareOp::Lte, value)
    }

    #[must_use]
    pub const fn gt(column: Column, value: i64) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    #[must_use]
    pub const fn gte(column: Column, value: i64) -> Self {
        Self::compare(column, CompareOp::Gte, value)
    }

    /// Membership test; an empty set matches nothing.
    #[must_use]
    pub fn in_(column: Column, values: Vec<i64>) -> Self {
        if values.is_empty() {
            return Self::False;
        }

        Self::In { column, values }
    }

    #[must_use]
    pub const fn and(preds: Vec<Self>) -> Self {
        Self::And(preds)
    }

    #[must_use]
    pub const fn or(preds: Vec<Self>) -> Self {
        Self::Or(preds)
    }

    /// Evaluate against one row. Missing columns never match.
    #[must_use]
    pub fn eval(&self, row: &impl ColumnSource) -> bool {
        match self {
            Self::False => false,
            Self::Compare { column, op, value } => row
                .column(*column)
                .is_some_and(|left| op.holds(left, *value)),
            Self::In { column, values } => row
                .column(*column)
                .is_some_and(|left| values.contains(&left)),
            Self::And(preds) => preds.iter().all(|pred| pred.eval(row)),
            Self::Or(preds) => preds.iter().any(|pred| pred.eval(row)),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // matches nothing; `IN ()` is not valid SQL
            Self::False => f.write_str("(1=0)"),
            Self::Compare { column, op, value } => {
                write!(f, "{column} {} {value}", op.symbol())
            }
            Self::In { column, values } => {
                write!(f, "{column} IN (")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str(")")
            }
            Self::And(preds) => write_joined(f, preds, " AND ", "(1=1)"),
            Self::Or(preds) => write_joined(f, preds, " OR ", "(1=0)"),
        }
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    preds: &[Predicate],
    glue: &str,
    empty: &str,
) -> fmt::Result {
    if preds.is_empty() {
        return f.write_str(empty);
    }

    f.write_str("(")?;
    for (idx, pred) in preds.iter().enumerate() {
        if idx > 0 {
            f.write_str(glue)?;
        }
        write!(f, "{pred}")?;
    }
    f.write_str(")")
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        operation_id: i64,
        order: i64,
    }

    impl ColumnSource for Row {
        fn column(&self, column: Column) -> Option<i64> {
            match column {
                Column::EffectOperationId => Some(self.operation_id),
                Column::EffectOrder => Some(self.order),
                _ => None,
            }
        }
    }

    #[test]
    fn empty_membership_collapses_to_false() {
        assert_eq!(
            Predicate::in_(Column::EffectOperationId, vec![]),
            Predicate::False
        );
    }

    #[test]
    fn missing_column_never_matches() {
        let row = Row {
            operation_id: 1,
            order: 1,
        };

        assert!(!Predicate::eq(Column::EffectAccountId, 1).eval(&row));
    }

    #[test]
    fn eval_follows_boolean_structure() {
        let row = Row {
            operation_id: 10,
            order: 3,
        };
        let pred = Predicate::and(vec![
            Predicate::gte(Column::EffectOperationId, 10),
            Predicate::or(vec![
                Predicate::gt(Column::EffectOperationId, 10),
                Predicate::gt(Column::EffectOrder, 2),
            ]),
        ]);

        assert!(pred.eval(&row));
        assert!(!pred.eval(&Row {
            operation_id: 10,
            order: 2
        }));
    }

    #[test]
    fn renders_sql_text() {
        let pred = Predicate::and(vec![
            Predicate::gte(Column::EffectOperationId, 5),
            Predicate::in_(Column::EffectAccountId, vec![1, 2]),
        ]);

        assert_eq!(
            pred.to_string(),
            "(heff.history_operation_id >= 5 AND heff.history_account_id IN (1, 2))"
        );
    }
}
