// `calscope dupes` - flag working-list rows that share an address

use std::path::Path;

use calscope_engine::dupes::find_duplicates;
use calscope_io::list_csv;

use crate::exit_codes::EXIT_DUPES_FOUND;
use crate::CliError;

pub fn cmd_dupes(list: &Path, json: bool, quiet: bool) -> Result<(), CliError> {
    let rows = list_csv::import(list).map_err(CliError::list)?;
    let flagged = find_duplicates(&rows);

    for &idx in &flagged {
        let row = &rows[idx];
        if json {
            let line = serde_json::json!({
                "row": idx + 1,
                "name": row.name,
                "address": row.address,
            });
            println!("{line}");
        } else {
            // 1-indexed data rows, matching what a spreadsheet shows
            println!("{}\t{}\t{}", idx + 1, row.name, row.address);
        }
    }

    if flagged.is_empty() {
        if !quiet {
            eprintln!("no duplicate addresses in {} rows", rows.len());
        }
        Ok(())
    } else {
        if !quiet {
            eprintln!("{} of {} rows share an address", flagged.len(), rows.len());
        }
        // Finding, not failure; message already printed above.
        Err(CliError { code: EXIT_DUPES_FOUND, message: String::new(), hint: None })
    }
}
