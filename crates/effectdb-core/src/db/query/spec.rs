use crate::db::{
    direction::Direction,
    predicate::{Column, Predicate},
};
use std::fmt;

///
/// Source
///
/// Base relation a query reads from, with its fixed projection and joins.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Source {
    Effects,
    OperationLiquidityPools,
}

impl Source {
    const fn projection(self) -> &'static str {
        match self {
            Self::Effects => "heff.*, hacc.address",
            Self::OperationLiquidityPools => "holp.history_operation_id",
        }
    }

    const fn from_clause(self) -> &'static str {
        match self {
            Self::Effects => "history_effects heff",
            Self::OperationLiquidityPools => "history_operation_liquidity_pools holp",
        }
    }

    /// Leading column of the relation's primary ordering index.
    #[must_use]
    pub const fn leading_column(self) -> Column {
        match self {
            Self::Effects => Column::EffectOperationId,
            Self::OperationLiquidityPools => Column::PoolOperationId,
        }
    }
}

///
/// Join
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Join {
    pub table: &'static str,
    pub on: &'static str,
}

const ACCOUNT_JOIN: Join = Join {
    table: "history_accounts hacc",
    on: "hacc.id = heff.history_account_id",
};

///
/// OrderTerm
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OrderTerm {
    pub column: Column,
    pub direction: Direction,
}

///
/// QuerySpec
///
/// Persistent description of one read: every mutator consumes `self` and
/// returns the advanced value, so a spec is never shared mutably between
/// requests. Predicates are implicitly AND-ed.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QuerySpec {
    source: Source,
    joins: Vec<Join>,
    predicates: Vec<Predicate>,
    order: Vec<OrderTerm>,
    limit: Option<u64>,
}

impl QuerySpec {
    const fn new(source: Source, joins: Vec<Join>) -> Self {
        Self {
            source,
            joins,
            predicates: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Effects with the owning account's address left-joined in.
    #[must_use]
    pub fn effects() -> Self {
        Self::new(Source::Effects, vec![ACCOUNT_JOIN])
    }

    /// Operation ids from the operation/liquidity-pool join table.
    #[must_use]
    pub const fn operation_liquidity_pools() -> Self {
        Self::new(Source::OperationLiquidityPools, Vec::new())
    }

    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: Column, direction: Direction) -> Self {
        self.order.push(OrderTerm { column, direction });
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn source(&self) -> Source {
        self.source
    }

    #[must_use]
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    #[must_use]
    pub fn order(&self) -> &[OrderTerm] {
        &self.order
    }

    #[must_use]
    pub const fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    /// Conjunction of every accumulated predicate.
    #[must_use]
    pub fn predicate(&self) -> Predicate {
        Predicate::And(self.predicates.clone())
    }
}

impl fmt::Display for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SELECT {} FROM {}",
            self.source.projection(),
            self.source.from_clause()
        )?;

        for join in &self.joins {
            write!(f, " LEFT JOIN {} ON {}", join.table, join.on)?;
        }

        for (idx, predicate) in self.predicates.iter().enumerate() {
            let keyword = if idx == 0 { "WHERE" } else { "AND" };
            write!(f, " {keyword} {predicate}")?;
        }

        for (idx, term) in self.order.iter().enumerate() {
            let keyword = if idx == 0 { " ORDER BY" } else { "," };
            write!(f, "{keyword} {} {}", term.column, term.direction)?;
        }

        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }

        Ok(())
    }
}
