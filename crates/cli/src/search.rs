// `calscope search` - query a description source

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use calscope_engine::query::{MatchPosition, Query, SearchField};
use calscope_engine::search::{run_search, CancelToken, SearchEvent};

use calscope_io::open_description;

use crate::config::CliConfig;
use crate::CliError;

pub struct SearchArgs<'a> {
    pub description: &'a Path,
    pub text: &'a str,
    pub field: SearchField,
    pub position: MatchPosition,
    pub max_items: Option<usize>,
    pub batch_size: Option<usize>,
    pub json: bool,
    pub quiet: bool,
}

pub fn cmd_search(args: SearchArgs<'_>, config: &CliConfig) -> Result<(), CliError> {
    let backend = open_description(args.description).map_err(CliError::list)?;

    let query = Query::new(args.field, args.position, args.text)
        .with_max_items(args.max_items.unwrap_or(config.search.max_items))
        .with_batch_size(args.batch_size.unwrap_or(config.search.batch_size));

    let cancel: CancelToken = Arc::new(AtomicBool::new(false));
    let mut emit_error = None;

    let outcome = run_search(backend.as_ref(), &query, &cancel, &mut |event| match event {
        SearchEvent::Item(m) => {
            if args.json {
                match serde_json::to_string(&m) {
                    Ok(line) => println!("{line}"),
                    Err(e) => emit_error = Some(e.to_string()),
                }
            } else {
                println!("{}\t{}\t{}\t{}", m.name, m.display_address(), m.unit, m.equation);
            }
        }
        SearchEvent::Done(summary) => {
            if !args.quiet {
                eprintln!("{summary}");
            }
        }
        SearchEvent::Started { .. } | SearchEvent::Batch(_) => {}
    });

    if let Some(msg) = emit_error {
        return Err(CliError::io(format!("cannot serialize result: {msg}")));
    }
    outcome.map_err(CliError::search)?;
    Ok(())
}
