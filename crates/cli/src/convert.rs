// `calscope convert` - materialize a working list as a description database

use std::fs;
use std::path::Path;

use calscope_io::{list_csv, RelationalBackend};

use crate::CliError;

pub fn cmd_convert(list: &Path, output: &Path, force: bool, quiet: bool) -> Result<(), CliError> {
    let rows = list_csv::import(list).map_err(CliError::list)?;

    if output.exists() {
        if !force {
            return Err(CliError::args(format!("output already exists: {}", output.display()))
                .with_hint("pass --force to overwrite"));
        }
        fs::remove_file(output)
            .map_err(|e| CliError::io(format!("cannot remove {}: {e}", output.display())))?;
    }

    let db = RelationalBackend::create(output).map_err(CliError::io)?;
    let (inserted, skipped) = db.materialize_list(&rows).map_err(CliError::io)?;

    if !quiet {
        if skipped > 0 {
            eprintln!("materialized {inserted} records ({skipped} rows skipped)");
        } else {
            eprintln!("materialized {inserted} records");
        }
    }
    Ok(())
}
