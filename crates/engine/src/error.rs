use std::fmt;

#[derive(Debug)]
pub enum SearchError {
    /// The query text could not be parsed (unparsable address string).
    InvalidQuery(String),
    /// Failure inside the backing store (malformed session, SQL error).
    Backend(String),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidQuery(text) => write!(f, "invalid query: cannot parse \"{text}\" as an address"),
            Self::Backend(msg) => write!(f, "backend error: {msg}"),
        }
    }
}

impl std::error::Error for SearchError {}
