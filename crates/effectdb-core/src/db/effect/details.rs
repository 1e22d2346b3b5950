//! Versioned decode of effect detail payloads.
//!
//! Payloads are decoded into a wire shape that records which fields were
//! present, classified into a version, and then normalized by a pure
//! backfill step. Older payloads are never rewritten in storage.

use super::EffectType;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Longest canonical `CODE:ISSUER` string for a 4-character asset code.
const ALPHANUM4_CANONICAL_MAX_LEN: usize = 61;

///
/// DetailsError
///

#[derive(Debug, ThisError)]
pub enum DetailsError {
    #[error("unmarshal effect details failed: {0}")]
    Json(#[from] serde_json::Error),
}

///
/// DetailsVersion
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DetailsVersion {
    /// Written before `asset_type` existed on trustline sponsorship payloads.
    V1,
    V2,
}

///
/// TrustlineSponsorship
///
/// Normalized trustline sponsorship payload, shared by the created, updated
/// and removed kinds.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TrustlineSponsorship {
    pub asset_type: String,
    pub asset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sponsor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub former_sponsor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_sponsor: Option<String>,
}

// Wire shape: `asset_type` may be absent or empty on V1 rows.
#[derive(Deserialize)]
struct TrustlineSponsorshipWire {
    #[serde(default)]
    asset_type: Option<String>,
    #[serde(default)]
    asset: String,
    #[serde(default)]
    sponsor: Option<String>,
    #[serde(default)]
    former_sponsor: Option<String>,
    #[serde(default)]
    new_sponsor: Option<String>,
}

impl TrustlineSponsorshipWire {
    fn version(&self) -> DetailsVersion {
        match self.asset_type.as_deref() {
            None | Some("") => DetailsVersion::V1,
            Some(_) => DetailsVersion::V2,
        }
    }
}

///
/// EffectDetails
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EffectDetails {
    TrustlineSponsorshipCreated(TrustlineSponsorship),
    TrustlineSponsorshipUpdated(TrustlineSponsorship),
    TrustlineSponsorshipRemoved(TrustlineSponsorship),
    Raw(serde_json::Value),
}

/// Asset type implied by a canonical `CODE:ISSUER` asset string.
#[must_use]
pub const fn asset_type_for_canonical(canonical: &str) -> &'static str {
    if canonical.len() <= ALPHANUM4_CANONICAL_MAX_LEN {
        "credit_alphanum4"
    } else {
        "credit_alphanum12"
    }
}

pub(super) fn decode(effect_type: EffectType, raw: &str) -> Result<EffectDetails, DetailsError> {
    let details = match effect_type {
        EffectType::TrustlineSponsorshipCreated => {
            EffectDetails::TrustlineSponsorshipCreated(decode_trustline_sponsorship(raw)?)
        }
        EffectType::TrustlineSponsorshipUpdated => {
            EffectDetails::TrustlineSponsorshipUpdated(decode_trustline_sponsorship(raw)?)
        }
        EffectType::TrustlineSponsorshipRemoved => {
            EffectDetails::TrustlineSponsorshipRemoved(decode_trustline_sponsorship(raw)?)
        }
        _ => EffectDetails::Raw(serde_json::from_str(raw)?),
    };

    Ok(details)
}

fn decode_trustline_sponsorship(raw: &str) -> Result<TrustlineSponsorship, DetailsError> {
    let wire: TrustlineSponsorshipWire = serde_json::from_str(raw)?;
    let version = wire.version();

    Ok(backfill(version, wire))
}

fn backfill(version: DetailsVersion, wire: TrustlineSponsorshipWire) -> TrustlineSponsorship {
    let asset_type = match version {
        DetailsVersion::V1 => asset_type_for_canonical(&wire.asset).to_string(),
        DetailsVersion::V2 => wire.asset_type.unwrap_or_default(),
    };

    TrustlineSponsorship {
        asset_type,
        asset: wire.asset,
        sponsor: wire.sponsor,
        former_sponsor: wire.former_sponsor,
        new_sponsor: wire.new_sponsor,
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    const ISSUER: &str = "GDUKMGUGDZQK6YHYA5Z6AY2G4XDSZPSZ3SW5UN3ARVMO6QSRDWP5YLEX";

    #[test]
    fn v1_sponsorship_gets_asset_type_from_code_length() {
        let short = format!(r#"{{"asset":"USD:{ISSUER}","sponsor":"GA"}}"#);
        let long = format!(r#"{{"asset":"LONGASSET:{ISSUER}"}}"#);

        let EffectDetails::TrustlineSponsorshipCreated(short) =
            decode(EffectType::TrustlineSponsorshipCreated, &short).expect("v1 decodes")
        else {
            panic!("expected trustline sponsorship details");
        };
        let EffectDetails::TrustlineSponsorshipRemoved(long) =
            decode(EffectType::TrustlineSponsorshipRemoved, &long).expect("v1 decodes")
        else {
            panic!("expected trustline sponsorship details");
        };

        assert_eq!(short.asset_type, "credit_alphanum4");
        assert_eq!(short.sponsor.as_deref(), Some("GA"));
        assert_eq!(long.asset_type, "credit_alphanum12");
    }

    #[test]
    fn empty_asset_type_counts_as_v1() {
        let raw = format!(r#"{{"asset_type":"","asset":"EUR:{ISSUER}"}}"#);
        let EffectDetails::TrustlineSponsorshipUpdated(details) =
            decode(EffectType::TrustlineSponsorshipUpdated, &raw).expect("decodes")
        else {
            panic!("expected trustline sponsorship details");
        };

        assert_eq!(details.asset_type, "credit_alphanum4");
    }

    #[test]
    fn v2_sponsorship_keeps_stored_asset_type() {
        let raw = r#"{"asset_type":"liquidity_pool_shares","asset":"abc"}"#;
        let EffectDetails::TrustlineSponsorshipCreated(details) =
            decode(EffectType::TrustlineSponsorshipCreated, raw).expect("v2 decodes")
        else {
            panic!("expected trustline sponsorship details");
        };

        assert_eq!(details.asset_type, "liquidity_pool_shares");
    }

    #[test]
    fn other_kinds_stay_raw() {
        let details = decode(EffectType::AccountCredited, r#"{"amount":"10.0"}"#)
            .expect("raw payload decodes");

        assert_eq!(
            details,
            EffectDetails::Raw(serde_json::json!({ "amount": "10.0" }))
        );
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = decode(EffectType::Trade, "{").expect_err("bad json should fail");
        assert!(err.to_string().starts_with("unmarshal effect details failed"));
    }
}
