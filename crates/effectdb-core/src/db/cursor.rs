//! Paging-token codec.
//!
//! A paging token is two decimal integers joined by a separator, for example
//! `"42-1"`. This module owns only the token text format; what the two
//! fields mean to a query lives in `db::keyset`.

use thiserror::Error as ThisError;

/// Largest value the stored `order` column can hold.
///
/// Decoded minor values above it are clamped, which keeps tokens issued
/// before the column was narrowed usable.
pub const MAX_ORDER: i64 = i32::MAX as i64;

/// Separator used by tokens the engine issues.
pub const DEFAULT_SEPARATOR: char = effectdb_config::DEFAULT_PAIR_SEPARATOR;

///
/// CursorDecodeError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CursorDecodeError {
    #[error("cursor '{token}' must be two integers separated by '{separator}'")]
    Shape { token: String, separator: char },

    #[error("cursor field '{field}' is not a valid integer")]
    InvalidInteger { field: String },

    #[error("cursor field {value} must not be negative")]
    Negative { value: i64 },
}

///
/// Cursor
///
/// Parsed resume point: composite operation key plus intra-operation order.
///

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct Cursor {
    pub major: i64,
    pub minor: i64,
}

impl Cursor {
    #[must_use]
    pub const fn new(major: i64, minor: i64) -> Self {
        Self { major, minor }
    }

    /// Resume point before every record.
    pub const START: Self = Self::new(0, 0);

    /// Resume point after every record, with the minor already clamped.
    pub const END: Self = Self::new(i64::MAX, MAX_ORDER);
}

/// Encode one `(operation_id, order)` pair as a paging token.
#[must_use]
pub fn encode_cursor(major: i64, minor: i64, separator: char) -> String {
    format!("{major}{separator}{minor}")
}

/// Decode a paging token, clamping the minor field to [`MAX_ORDER`].
///
/// The token must contain exactly one separator with a non-negative decimal
/// integer on each side.
pub fn decode_cursor(token: &str, separator: char) -> Result<Cursor, CursorDecodeError> {
    let (major, minor) = split_pair(token, separator)?;
    let major = parse_field(major)?;
    let minor = parse_field(minor)?;

    Ok(Cursor::new(major, minor.min(MAX_ORDER)))
}

fn split_pair(token: &str, separator: char) -> Result<(&str, &str), CursorDecodeError> {
    let shape_error = || CursorDecodeError::Shape {
        token: token.to_string(),
        separator,
    };

    let (major, minor) = token.split_once(separator).ok_or_else(shape_error)?;
    if minor.contains(separator) {
        return Err(shape_error());
    }

    Ok((major, minor))
}

fn parse_field(field: &str) -> Result<i64, CursorDecodeError> {
    let value = field
        .parse::<i64>()
        .map_err(|_| CursorDecodeError::InvalidInteger {
            field: field.to_string(),
        })?;

    if value < 0 {
        return Err(CursorDecodeError::Negative { value });
    }

    Ok(value)
}

///
/// TESTS
///
