use std::fmt;

#[derive(Debug)]
pub enum ListIoError {
    /// A required working-list column header is absent. The whole import
    /// fails; there is no partial load.
    MissingColumn(String),
    /// File read/write error.
    Io(String),
    /// CSV parse error.
    Csv(String),
    /// Description database open/build error.
    Database(String),
}

impl fmt::Display for ListIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn(column) => write!(f, "missing required column '{column}'"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Database(msg) => write!(f, "database error: {msg}"),
        }
    }
}

impl std::error::Error for ListIoError {}
