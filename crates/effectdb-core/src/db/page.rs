use crate::db::{
    cursor::{Cursor, DEFAULT_SEPARATOR, decode_cursor},
    direction::Direction,
    query::QueryError,
};
use effectdb_config::{MAX_LIMIT, PagingConfig};

///
/// PageQuery
///
/// Raw paging parameters of one request. Text fields are kept unparsed
/// until the page is applied, so a bad direction or cursor latches into the
/// query builder like any other failure.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageQuery {
    cursor: String,
    order: String,
    limit: u64,
    max_limit: u64,
    separator: char,
}

impl PageQuery {
    #[must_use]
    pub fn new(cursor: impl Into<String>, order: impl Into<String>, limit: u64) -> Self {
        Self {
            cursor: cursor.into(),
            order: order.into(),
            limit,
            max_limit: MAX_LIMIT,
            separator: DEFAULT_SEPARATOR,
        }
    }

    /// Build from optional request parameters, applying config defaults.
    ///
    /// A missing limit falls back to `default_limit`; zero or anything above
    /// `max_limit` is rejected. A missing order means ascending.
    pub fn from_params(
        cursor: Option<&str>,
        order: Option<&str>,
        limit: Option<u64>,
        config: &PagingConfig,
    ) -> Result<Self, QueryError> {
        let limit = limit.unwrap_or(config.default_limit);
        let order = match order {
            Some(order) if !order.is_empty() => order.to_string(),
            _ => Direction::default().to_string(),
        };

        let page = Self {
            cursor: cursor.unwrap_or_default().to_string(),
            order,
            limit,
            max_limit: config.max_limit,
            separator: config.separator,
        };
        page.checked_limit()?;

        Ok(page)
    }

    #[must_use]
    pub const fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    #[must_use]
    pub const fn with_max_limit(mut self, max_limit: u64) -> Self {
        self.max_limit = max_limit;
        self
    }

    #[must_use]
    pub fn raw_cursor(&self) -> &str {
        &self.cursor
    }

    #[must_use]
    pub fn raw_order(&self) -> &str {
        &self.order
    }

    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Largest limit the paging policy behind this request allows.
    #[must_use]
    pub const fn max_limit(&self) -> u64 {
        self.max_limit
    }

    /// Reject a zero limit or one above `max_limit`.
    pub fn checked_limit(&self) -> Result<u64, QueryError> {
        if self.limit == 0 || self.limit > self.max_limit {
            return Err(QueryError::InvalidLimit {
                limit: self.limit,
                max: self.max_limit,
            });
        }

        Ok(self.limit)
    }

    pub fn direction(&self) -> Result<Direction, QueryError> {
        self.order.parse().map_err(QueryError::InvalidOrder)
    }

    /// Parsed resume point.
    ///
    /// An empty cursor starts at the beginning of the stream in the
    /// requested direction.
    pub fn cursor(&self) -> Result<Cursor, QueryError> {
        if self.cursor.is_empty() {
            return Ok(match self.direction()? {
                Direction::Asc => Cursor::START,
                Direction::Desc => Cursor::END,
            });
        }

        Ok(decode_cursor(&self.cursor, self.separator)?)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::cursor::{CursorDecodeError, MAX_ORDER};

    #[test]
    fn missing_params_use_config_defaults() {
        let page = PageQuery::from_params(None, None, None, &PagingConfig::default())
            .expect("defaults should apply");

        assert_eq!(page.limit(), 10);
        assert_eq!(page.direction().expect("asc"), Direction::Asc);
        assert_eq!(page.cursor().expect("start"), Cursor::START);
    }

    #[test]
    fn limit_outside_bounds_is_rejected() {
        let config = PagingConfig::default();

        for limit in [0, config.max_limit + 1] {
            let err = PageQuery::from_params(None, None, Some(limit), &config)
                .expect_err("limit should be rejected");
            assert!(matches!(err, QueryError::InvalidLimit { max: 200, .. }));
        }
    }

    #[test]
    fn configured_max_limit_travels_with_page() {
        let config = PagingConfig {
            default_limit: 5,
            max_limit: 50,
            ..PagingConfig::default()
        };
        let page = PageQuery::from_params(Some("9-1"), Some("desc"), Some(50), &config)
            .expect("limit at max should be accepted");

        assert_eq!(page.max_limit(), 50);
        assert_eq!(page.raw_cursor(), "9-1");
        assert_eq!(page.raw_order(), "desc");

        let err = PageQuery::new("", "asc", 0)
            .with_max_limit(50)
            .checked_limit()
            .expect_err("zero limit should fail");
        assert!(matches!(err, QueryError::InvalidLimit { limit: 0, max: 50 }));
        assert_eq!(err.to_string(), "invalid limit 0: must be between 1 and 50");
    }

    #[test]
    fn missing_order_defaults_to_ascending_label() {
        let page = PageQuery::from_params(None, Some(""), None, &PagingConfig::default())
            .expect("defaults should apply");

        assert_eq!(page.raw_order(), "asc");
        assert!(page.direction().expect("asc").is_ascending());
    }

    #[test]
    fn empty_descending_cursor_starts_at_end() {
        let page = PageQuery::new("", "desc", 5);
        assert_eq!(
            page.cursor().expect("end cursor"),
            Cursor::new(i64::MAX, MAX_ORDER)
        );
    }

    #[test]
    fn unknown_direction_is_invalid_order() {
        let page = PageQuery::new("", "sideways", 5);

        let err = page.direction().expect_err("sideways should fail");
        assert!(matches!(err, QueryError::InvalidOrder(ref order) if order == "sideways"));
        assert!(page.cursor().is_err());
    }

    #[test]
    fn negative_cursor_is_malformed() {
        let page = PageQuery::new("5:-1", "asc", 5).with_separator(':');

        let err = page.cursor().expect_err("negative minor should fail");
        assert!(matches!(
            err,
            QueryError::MalformedCursor(CursorDecodeError::Negative { value: -1 })
        ));
    }

    #[test]
    fn config_separator_is_used_for_decoding() {
        let config = PagingConfig {
            separator: ':',
            ..PagingConfig::default()
        };
        let page = PageQuery::from_params(Some("42:1"), Some("desc"), Some(3), &config)
            .expect("params should be accepted");

        assert_eq!(page.cursor().expect("cursor"), Cursor::new(42, 1));
    }
}
