use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

///
/// Direction
///
/// Traversal direction over the `(operation_id, order)` total order.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    #[display("asc")]
    Asc,
    #[display("desc")]
    Desc,
}

impl Direction {
    #[must_use]
    pub const fn is_ascending(self) -> bool {
        matches!(self, Self::Asc)
    }
}

impl FromStr for Direction {
    type Err = String;

    /// Only the exact lowercase labels are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(other.to_string()),
        }
    }
}
