// `calscope replace` - reconcile working-list addresses across builds

use std::path::Path;

use calscope_io::{list_csv, open_description};
use calscope_recon::Reconciler;

use crate::CliError;

pub fn cmd_replace(
    list: &Path,
    original: &Path,
    new_db: &Path,
    output: Option<&Path>,
    quiet: bool,
) -> Result<(), CliError> {
    let mut rows = list_csv::import(list).map_err(CliError::list)?;
    let original = open_description(original).map_err(CliError::list)?;
    let new_db = open_description(new_db).map_err(CliError::list)?;

    let report = Reconciler::new()
        .run(&mut rows, original.as_ref(), new_db.as_ref(), &mut |line| {
            if !quiet {
                eprintln!("{line}");
            }
        })
        .map_err(CliError::replace)?;

    let target = output.unwrap_or(list);
    list_csv::export(target, &rows).map_err(CliError::list)?;

    if !quiet {
        eprintln!("{report}");
        if report.skipped_virtual > 0 {
            eprintln!("{} virtual rows left untouched", report.skipped_virtual);
        }
    }
    Ok(())
}
