//! `calscope-engine` — Calibration description search engine.
//!
//! Pure engine crate: queries run against any [`Backend`] implementation
//! (the SQLite-backed description lives in `calscope-io`). No file IO here.

pub mod backend;
pub mod conversion;
pub mod dupes;
pub mod error;
pub mod model;
pub mod query;
pub mod search;

pub use backend::{Backend, InMemoryBackend};
pub use error::SearchError;
pub use model::{ListRow, Measurement};
pub use query::{MatchPosition, Query, SearchField};
pub use search::{run_search, CancelToken, SearchEvent, SearchSummary, SingleFlight};
