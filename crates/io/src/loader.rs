// Description-source dispatch

use std::path::Path;

use calscope_engine::backend::{Backend, InMemoryBackend};

use crate::a2ldb::RelationalBackend;
use crate::error::ListIoError;
use crate::list_csv;

/// Open a description source by file extension: `.csv` loads a working list
/// into an in-memory description, anything else is treated as a relational
/// description database.
pub fn open_description(path: &Path) -> Result<Box<dyn Backend>, ListIoError> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        let rows = list_csv::import(path)?;
        Ok(Box::new(InMemoryBackend::from_rows(&rows)))
    } else {
        let db = RelationalBackend::open(path).map_err(ListIoError::Database)?;
        Ok(Box::new(db))
    }
}
