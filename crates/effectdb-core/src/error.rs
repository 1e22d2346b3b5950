use std::fmt;

///
/// ErrorClass
/// Runtime error taxonomy shared by every layer of the engine.
/// Callers branch on the class, never on message text.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    InvalidInput,
    NotFound,
    Unavailable,
    Cancelled,
    Corruption,
    Internal,
}

impl ErrorClass {
    /// True for failures a caller may reasonably retry.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::Unavailable => "unavailable",
            Self::Cancelled => "cancelled",
            Self::Corruption => "corruption",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Which layer raised the error.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Cursor,
    Query,
    Lookup,
    Store,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Cursor => "cursor",
            Self::Query => "query",
            Self::Lookup => "lookup",
            Self::Store => "store",
        };
        write!(f, "{label}")
    }
}
