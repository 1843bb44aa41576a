//! `calscope-io` — File I/O for calscope.
//!
//! SQLite-backed description databases, working-list CSV import/export,
//! and description-open dispatch. The engine itself never touches a file.

pub mod a2ldb;
pub mod error;
pub mod list_csv;
pub mod loader;

pub use a2ldb::RelationalBackend;
pub use error::ListIoError;
pub use loader::open_description;
