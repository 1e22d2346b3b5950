mod details;

pub use details::{
    DetailsError, DetailsVersion, EffectDetails, TrustlineSponsorship, asset_type_for_canonical,
};

use crate::db::{
    cursor::{DEFAULT_SEPARATOR, encode_cursor},
    key::OperationKey,
    predicate::{Column, ColumnSource},
};
use serde::de::DeserializeOwned;

///
/// EffectType
///
/// Numeric kind code stored with every effect. Codes this crate does not
/// name are carried through untouched.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EffectType {
    AccountCreated,
    AccountRemoved,
    AccountCredited,
    AccountDebited,
    TrustlineCreated,
    TrustlineRemoved,
    TrustlineUpdated,
    Trade,
    TrustlineSponsorshipCreated,
    TrustlineSponsorshipUpdated,
    TrustlineSponsorshipRemoved,
    LiquidityPoolDeposited,
    LiquidityPoolWithdrew,
    LiquidityPoolTrade,
    Other(i32),
}

impl EffectType {
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::AccountCreated,
            1 => Self::AccountRemoved,
            2 => Self::AccountCredited,
            3 => Self::AccountDebited,
            20 => Self::TrustlineCreated,
            21 => Self::TrustlineRemoved,
            22 => Self::TrustlineUpdated,
            33 => Self::Trade,
            63 => Self::TrustlineSponsorshipCreated,
            64 => Self::TrustlineSponsorshipUpdated,
            65 => Self::TrustlineSponsorshipRemoved,
            90 => Self::LiquidityPoolDeposited,
            91 => Self::LiquidityPoolWithdrew,
            92 => Self::LiquidityPoolTrade,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::AccountCreated => 0,
            Self::AccountRemoved => 1,
            Self::AccountCredited => 2,
            Self::AccountDebited => 3,
            Self::TrustlineCreated => 20,
            Self::TrustlineRemoved => 21,
            Self::TrustlineUpdated => 22,
            Self::Trade => 33,
            Self::TrustlineSponsorshipCreated => 63,
            Self::TrustlineSponsorshipUpdated => 64,
            Self::TrustlineSponsorshipRemoved => 65,
            Self::LiquidityPoolDeposited => 90,
            Self::LiquidityPoolWithdrew => 91,
            Self::LiquidityPoolTrade => 92,
            Self::Other(code) => code,
        }
    }
}

///
/// EffectRow
///
/// Effect as stored, before the account join.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EffectRow {
    pub operation_id: i64,
    pub order: i32,
    pub account_id: i64,
    pub effect_type: EffectType,
    pub details: Option<String>,
}

impl ColumnSource for EffectRow {
    fn column(&self, column: Column) -> Option<i64> {
        match column {
            Column::EffectOperationId => Some(self.operation_id),
            Column::EffectOrder => Some(i64::from(self.order)),
            Column::EffectAccountId => Some(self.account_id),
            Column::EffectType => Some(i64::from(self.effect_type.code())),
            Column::PoolOperationId | Column::PoolInternalId => None,
        }
    }
}

///
/// Effect
///
/// Materialized query row: the stored effect plus the owning account's
/// address from the left join.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Effect {
    pub operation_id: i64,
    pub order: i32,
    pub account_id: i64,
    pub address: Option<String>,
    pub effect_type: EffectType,
    pub details: Option<String>,
}

impl Effect {
    #[must_use]
    pub fn from_row(row: EffectRow, address: Option<String>) -> Self {
        Self {
            operation_id: row.operation_id,
            order: row.order,
            account_id: row.account_id,
            address,
            effect_type: row.effect_type,
            details: row.details,
        }
    }

    /// Fixed-width identifier whose string order equals `(operation_id, order)` order.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{:019}-{:010}", self.operation_id, self.order)
    }

    /// Resume token for the page ending at this effect.
    #[must_use]
    pub fn paging_token(&self) -> String {
        self.paging_token_with(DEFAULT_SEPARATOR)
    }

    /// Resume token using a configured separator.
    #[must_use]
    pub fn paging_token_with(&self, separator: char) -> String {
        encode_cursor(self.operation_id, i64::from(self.order), separator)
    }

    #[must_use]
    pub fn ledger_sequence(&self) -> Option<i32> {
        OperationKey::parse(self.operation_id)
            .ok()
            .map(OperationKey::ledger_sequence)
    }

    /// Decode the raw JSON payload into a caller-chosen type.
    pub fn unmarshal_details<T: DeserializeOwned>(&self) -> Result<Option<T>, DetailsError> {
        let Some(raw) = self.details.as_deref() else {
            return Ok(None);
        };

        serde_json::from_str(raw).map(Some).map_err(DetailsError::from)
    }

    /// Decode the payload for this effect's kind, backfilling fields older
    /// payloads lack.
    pub fn decode_details(&self) -> Result<Option<EffectDetails>, DetailsError> {
        let Some(raw) = self.details.as_deref() else {
            return Ok(None);
        };

        details::decode(self.effect_type, raw).map(Some)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;

    fn effect(operation_id: i64, order: i32) -> Effect {
        Effect {
            operation_id,
            order,
            account_id: 1,
            address: None,
            effect_type: EffectType::AccountCredited,
            details: None,
        }
    }

    #[test]
    fn identifier_and_token_formats() {
        let first = effect(42, 1);
        let second = effect(42, 2);

        assert_eq!(first.id(), "0000000000000000042-0000000001");
        assert_eq!(second.id(), "0000000000000000042-0000000002");
        assert!(first.id() < second.id());
        assert_eq!(first.paging_token(), "42-1");
    }

    #[test]
    fn ledger_sequence_comes_from_operation_key() {
        let key = OperationKey::new(77, 2, 1).expect("key should build");
        assert_eq!(effect(key.to_i64(), 1).ledger_sequence(), Some(77));
    }

    #[test]
    fn unknown_type_codes_round_trip() {
        assert_eq!(EffectType::from_code(1234), EffectType::Other(1234));
        assert_eq!(EffectType::from_code(63).code(), 63);
    }

    #[test]
    fn absent_details_decode_to_none() {
        let decoded = effect(1, 1).decode_details().expect("null details decode");
        assert_eq!(decoded, None);

        let typed: Option<Credit> = effect(1, 1)
            .unmarshal_details()
            .expect("null details unmarshal");
        assert_eq!(typed, None);
    }

    #[derive(Debug, Deserialize, Eq, PartialEq)]
    struct Credit {
        amount: String,
        asset_type: String,
    }

    #[test]
    fn unmarshal_details_into_typed_payload() {
        let mut credited = effect(1, 1);
        credited.details = Some(r#"{"amount":"10.0000000","asset_type":"native"}"#.to_string());

        let typed: Option<Credit> = credited
            .unmarshal_details()
            .expect("credit details should unmarshal");
        assert_eq!(
            typed,
            Some(Credit {
                amount: "10.0000000".to_string(),
                asset_type: "native".to_string(),
            })
        );
    }

    #[test]
    fn decode_details_backfills_sponsorship_asset_type() {
        let mut sponsored = effect(1, 1);
        sponsored.effect_type = EffectType::TrustlineSponsorshipCreated;
        sponsored.details = Some(r#"{"asset":"USD:GISSUER","sponsor":"GSPONSOR"}"#.to_string());

        let decoded = sponsored
            .decode_details()
            .expect("sponsorship details should decode");
        let Some(EffectDetails::TrustlineSponsorshipCreated(details)) = decoded else {
            panic!("expected trustline sponsorship details, got {decoded:?}");
        };

        assert_eq!(details.asset_type, "credit_alphanum4");
        assert_eq!(details.sponsor.as_deref(), Some("GSPONSOR"));
    }

    #[test]
    fn malformed_details_report_json_error() {
        let mut broken = effect(1, 1);
        broken.details = Some("{not json".to_string());

        let err = broken
            .decode_details()
            .expect_err("malformed details should fail");
        assert!(matches!(err, DetailsError::Json(_)));
        assert!(err.to_string().starts_with("unmarshal effect details failed: "));

        let err = broken
            .unmarshal_details::<Credit>()
            .expect_err("malformed details should fail");
        assert!(matches!(err, DetailsError::Json(_)));
    }

    #[test]
    fn paging_token_uses_requested_separator() {
        let first = effect(42, 1);
        let token = first.paging_token_with(':');

        assert_eq!(token, "42:1");
        assert_eq!(
            crate::db::cursor::decode_cursor(&token, ':').expect("token should decode"),
            crate::db::cursor::Cursor::new(42, 1)
        );
    }

    proptest! {
        #[test]
        fn identifier_order_matches_numeric_pair_order(
            a in (0..=i64::MAX, 0..=i32::MAX),
            b in (0..=i64::MAX, 0..=i32::MAX),
        ) {
            let ea = effect(a.0, a.1);
            let eb = effect(b.0, b.1);

            prop_assert_eq!(ea.id().cmp(&eb.id()), a.cmp(&b));
        }
    }
}
