//! Entity-scoped key ranges.
//!
//! Ledgers, transactions and operations are contiguous in the composite key
//! space, so each narrows the scan to a half-open `[start, end)` range.
//! Accounts are not contiguous and filter by equality instead.

use crate::db::{
    key::{KeyError, OperationKey},
    predicate::{Column, Predicate},
};

///
/// KeyRange
///
/// Half-open range over composite keys. `end == None` means the range runs
/// to the end of the key space.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyRange {
    pub start: i64,
    pub end: Option<i64>,
}

impl KeyRange {
    // A successor past the last ledger leaves the range open-ended.
    fn from_successor(
        start: OperationKey,
        successor: Result<OperationKey, KeyError>,
    ) -> Result<Self, KeyError> {
        let end = match successor {
            Ok(end) => Some(end.to_i64()),
            Err(KeyError::LedgerOverflow) => None,
            Err(err) => return Err(err),
        };

        Ok(Self {
            start: start.to_i64(),
            end,
        })
    }

    #[must_use]
    pub const fn contains(self, key: i64) -> bool {
        key >= self.start
            && match self.end {
                Some(end) => key < end,
                None => true,
            }
    }

    /// Predicate form over one key column.
    #[must_use]
    pub fn predicate(self, column: Column) -> Predicate {
        match self.end {
            Some(end) => Predicate::and(vec![
                Predicate::gte(column, self.start),
                Predicate::lt(column, end),
            ]),
            None => Predicate::gte(column, self.start),
        }
    }
}

/// `[key(L, 0, 0), key(L + 1, 0, 0))`
pub fn ledger_range(sequence: i32) -> Result<KeyRange, KeyError> {
    let start = OperationKey::ledger_start(sequence)?;
    let successor = match sequence.checked_add(1) {
        Some(next) => OperationKey::ledger_start(next),
        None => Err(KeyError::LedgerOverflow),
    };

    KeyRange::from_successor(start, successor)
}

/// Exactly one operation.
pub fn operation_range(operation_id: i64) -> Result<KeyRange, KeyError> {
    let start = OperationKey::parse(operation_id)?;

    KeyRange::from_successor(start, start.increment_operation_order())
}

/// Every operation of the transaction keyed by `transaction_id`.
pub fn transaction_range(transaction_id: i64) -> Result<KeyRange, KeyError> {
    let start = OperationKey::parse(transaction_id)?;

    KeyRange::from_successor(start, start.increment_transaction_order())
}

/// Equality on the owning account; not a key range.
#[must_use]
pub const fn account_predicate(account_id: i64) -> Predicate {
    Predicate::eq(Column::EffectAccountId, account_id)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn key(ledger: i32, tx: i32, op: i32) -> i64 {
        OperationKey::new(ledger, tx, op)
            .expect("key should build")
            .to_i64()
    }

    #[test]
    fn ledger_range_excludes_neighbouring_ledgers() {
        let range = ledger_range(10).expect("range should build");

        assert_eq!(range.start, key(10, 0, 0));
        assert_eq!(range.end, Some(key(11, 0, 0)));
        assert!(range.contains(key(10, 0, 0)));
        assert!(range.contains(key(10, (1 << 20) - 1, 4095)));
        assert!(!range.contains(key(9, (1 << 20) - 1, 4095)));
        assert!(!range.contains(key(11, 0, 0)));
    }

    #[test]
    fn last_ledger_range_is_open_ended() {
        let range = ledger_range(i32::MAX).expect("range should build");
        assert_eq!(range.end, None);
        assert_eq!(
            range.predicate(Column::EffectOperationId),
            Predicate::gte(Column::EffectOperationId, range.start)
        );
    }

    #[test]
    fn negative_ledger_is_rejected() {
        assert_eq!(ledger_range(-1), Err(KeyError::LedgerOutOfRange(-1)));
    }

    #[test]
    fn operation_range_covers_single_operation() {
        let range = operation_range(key(5, 2, 7)).expect("range should build");

        assert_eq!(range.start, key(5, 2, 7));
        assert_eq!(range.end, Some(key(5, 2, 8)));
    }

    #[test]
    fn transaction_range_covers_all_operations_in_transaction() {
        let range = transaction_range(key(5, 2, 0)).expect("range should build");

        assert!(range.contains(key(5, 2, 1)));
        assert!(range.contains(key(5, 2, 4095)));
        assert!(!range.contains(key(5, 3, 0)));
        assert!(!range.contains(key(5, 1, 4095)));
    }

    #[test]
    fn bounded_range_renders_half_open_sql() {
        let range = KeyRange {
            start: 100,
            end: Some(200),
        };

        assert_eq!(
            range.predicate(Column::EffectOperationId).to_string(),
            "(heff.history_operation_id >= 100 AND heff.history_operation_id < 200)"
        );
    }
}
