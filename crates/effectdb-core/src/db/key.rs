//! Composite operation key codec.
//!
//! One signed 64-bit key packs `(ledger, transaction, operation)` so that
//! integer comparison matches chronological order:
//!
//! ```text
//!  63        32 31              12 11          0
//! [  ledger   ][ transaction order ][ op order  ]
//! ```
//!
//! The sign bit is never set because ledger sequences are non-negative `i32`.

use std::fmt;
use thiserror::Error as ThisError;

const LEDGER_SHIFT: u32 = 32;
const TRANSACTION_SHIFT: u32 = 12;

const LEDGER_MASK: i64 = (1 << 32) - 1;
const TRANSACTION_MASK: i64 = (1 << 20) - 1;
const OPERATION_MASK: i64 = (1 << 12) - 1;

///
/// KeyError
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, ThisError)]
pub enum KeyError {
    #[error("ledger sequence {0} is out of range")]
    LedgerOutOfRange(i32),

    #[error("transaction order {0} is out of range")]
    TransactionOutOfRange(i32),

    #[error("operation order {0} is out of range")]
    OperationOutOfRange(i32),

    #[error("operation key {0} is negative")]
    Negative(i64),

    #[error("incrementing the operation key overflows the ledger field")]
    LedgerOverflow,
}

///
/// OperationKey
///
/// Decoded form of the composite key. Fields are always within their bit
/// widths, so `to_i64` is total.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct OperationKey {
    ledger_sequence: i32,
    transaction_order: i32,
    operation_order: i32,
}

impl OperationKey {
    /// Build a key from its parts, rejecting fields outside their widths.
    pub fn new(
        ledger_sequence: i32,
        transaction_order: i32,
        operation_order: i32,
    ) -> Result<Self, KeyError> {
        if ledger_sequence < 0 {
            return Err(KeyError::LedgerOutOfRange(ledger_sequence));
        }
        if transaction_order < 0 || i64::from(transaction_order) > TRANSACTION_MASK {
            return Err(KeyError::TransactionOutOfRange(transaction_order));
        }
        if operation_order < 0 || i64::from(operation_order) > OPERATION_MASK {
            return Err(KeyError::OperationOutOfRange(operation_order));
        }

        Ok(Self {
            ledger_sequence,
            transaction_order,
            operation_order,
        })
    }

    /// First key of a ledger, `key(ledger, 0, 0)`.
    pub fn ledger_start(ledger_sequence: i32) -> Result<Self, KeyError> {
        Self::new(ledger_sequence, 0, 0)
    }

    /// Decode a packed key. Negative inputs never come from the encoder.
    #[expect(clippy::cast_possible_truncation)]
    pub const fn parse(id: i64) -> Result<Self, KeyError> {
        if id < 0 {
            return Err(KeyError::Negative(id));
        }

        Ok(Self {
            ledger_sequence: ((id >> LEDGER_SHIFT) & LEDGER_MASK) as i32,
            transaction_order: ((id >> TRANSACTION_SHIFT) & TRANSACTION_MASK) as i32,
            operation_order: (id & OPERATION_MASK) as i32,
        })
    }

    #[must_use]
    pub const fn to_i64(self) -> i64 {
        ((self.ledger_sequence as i64) << LEDGER_SHIFT)
            | ((self.transaction_order as i64) << TRANSACTION_SHIFT)
            | (self.operation_order as i64)
    }

    #[must_use]
    pub const fn ledger_sequence(self) -> i32 {
        self.ledger_sequence
    }

    #[must_use]
    pub const fn transaction_order(self) -> i32 {
        self.transaction_order
    }

    #[must_use]
    pub const fn operation_order(self) -> i32 {
        self.operation_order
    }

    /// Next operation slot; carries into the transaction field on overflow.
    pub const fn increment_operation_order(self) -> Result<Self, KeyError> {
        if (self.operation_order as i64) < OPERATION_MASK {
            return Ok(Self {
                operation_order: self.operation_order + 1,
                ..self
            });
        }

        Self {
            operation_order: 0,
            ..self
        }
        .increment_transaction_order()
    }

    /// Next transaction slot; carries into the ledger field on overflow.
    ///
    /// The operation order is left as-is, so `key(l, t, 0)` steps to
    /// `key(l, t + 1, 0)`.
    pub const fn increment_transaction_order(self) -> Result<Self, KeyError> {
        if (self.transaction_order as i64) < TRANSACTION_MASK {
            return Ok(Self {
                transaction_order: self.transaction_order + 1,
                ..self
            });
        }

        if self.ledger_sequence == i32::MAX {
            return Err(KeyError::LedgerOverflow);
        }

        Ok(Self {
            ledger_sequence: self.ledger_sequence + 1,
            transaction_order: 0,
            ..self
        })
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.ledger_sequence, self.transaction_order, self.operation_order
        )
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn packs_fields_into_their_bit_ranges() {
        let key = OperationKey::new(1, 2, 3).expect("key should build");
        assert_eq!(key.to_i64(), (1 << 32) | (2 << 12) | 3);
    }

    #[test]
    fn rejects_out_of_width_fields() {
        assert_eq!(
            OperationKey::new(-1, 0, 0),
            Err(KeyError::LedgerOutOfRange(-1))
        );
        assert_eq!(
            OperationKey::new(0, 1 << 20, 0),
            Err(KeyError::TransactionOutOfRange(1 << 20))
        );
        assert_eq!(
            OperationKey::new(0, 0, 1 << 12),
            Err(KeyError::OperationOutOfRange(1 << 12))
        );
    }

    #[test]
    fn parse_rejects_negative_keys() {
        assert_eq!(OperationKey::parse(-5), Err(KeyError::Negative(-5)));
    }

    #[test]
    fn operation_increment_carries_into_transaction() {
        let key = OperationKey::new(7, 3, 4095).expect("key should build");
        let next = key
            .increment_operation_order()
            .expect("increment should succeed");

        assert_eq!(next, OperationKey::new(7, 4, 0).expect("key should build"));
    }

    #[test]
    fn transaction_increment_carries_into_ledger() {
        let key = OperationKey::new(7, (1 << 20) - 1, 0).expect("key should build");
        let next = key
            .increment_transaction_order()
            .expect("increment should succeed");

        assert_eq!(next, OperationKey::new(8, 0, 0).expect("key should build"));
    }

    #[test]
    fn increment_past_last_ledger_overflows() {
        let key = OperationKey::new(i32::MAX, (1 << 20) - 1, 4095).expect("key should build");

        assert_eq!(
            key.increment_operation_order(),
            Err(KeyError::LedgerOverflow)
        );
    }

    proptest! {
        #[test]
        fn integer_order_matches_field_order(
            a in (0..=i32::MAX, 0..(1i32 << 20), 0..(1i32 << 12)),
            b in (0..=i32::MAX, 0..(1i32 << 20), 0..(1i32 << 12)),
        ) {
            let ka = OperationKey::new(a.0, a.1, a.2).expect("key should build");
            let kb = OperationKey::new(b.0, b.1, b.2).expect("key should build");

            prop_assert_eq!(ka.to_i64().cmp(&kb.to_i64()), a.cmp(&b));
            prop_assert_eq!(OperationKey::parse(ka.to_i64()), Ok(ka));
        }
    }
}
