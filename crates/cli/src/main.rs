// calscope CLI - headless calibration description search and list upkeep

mod config;
mod convert;
mod dupes;
mod exit_codes;
mod replace;
mod search;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use calscope_engine::error::SearchError;
use calscope_engine::query::{MatchPosition, SearchField};
use calscope_io::ListIoError;
use calscope_recon::ReconError;

use exit_codes::{
    list_exit_code, replace_exit_code, EXIT_LIST_IO, EXIT_LIST_PARSE, EXIT_SEARCH_BACKEND,
    EXIT_SEARCH_INVALID_QUERY, EXIT_SUCCESS, EXIT_USAGE,
};

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  calscope-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  calscope-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

#[derive(Parser)]
#[command(name = "calscope")]
#[command(about = "Search and reconcile calibration description databases")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a description source by name, description text, or address
    #[command(after_help = "\
For address searches the position flag takes comparison semantics:
start = address >= value, end = address <= value, contains/equals = exact.

Examples:
  calscope search build42.a2ldb Eng
  calscope search build42.a2ldb speed --field description --position contains
  calscope search build42.a2ldb 0x1a00 --field address --position start
  calscope search worklist.csv EngSpeed --position equals --json")]
    Search {
        /// Description source (.csv working list or description database)
        description: PathBuf,

        /// Search text (hex address for address searches)
        text: String,

        /// Field to search
        #[arg(long, short = 'F', default_value = "name")]
        field: SearchField,

        /// Where the text must sit within the field
        #[arg(long, short = 'p', default_value = "start")]
        position: MatchPosition,

        /// Cap on emitted results
        #[arg(long)]
        max_items: Option<usize>,

        /// Results accumulated per batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Emit results as JSON lines
        #[arg(long)]
        json: bool,

        /// Suppress the stderr summary
        #[arg(long, short = 'q')]
        quiet: bool,

        /// Config file with search defaults
        #[arg(long, env = "CALSCOPE_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Flag working-list rows that share a non-virtual address
    #[command(after_help = "\
Exit code 20 indicates duplicates were found, like diff(1)'s exit 1.

Examples:
  calscope dupes worklist.csv
  calscope dupes worklist.csv --json")]
    Dupes {
        /// Working list to scan
        list: PathBuf,

        /// Emit flagged rows as JSON lines
        #[arg(long)]
        json: bool,

        /// Suppress the stderr summary
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Rewrite working-list addresses from one software build to the next
    #[command(after_help = "\
Each row's address is looked up in the original description to find the
variable's name, then that name is looked up in the new description to get
the new address. Rows that cannot be traced keep their address and are
reported on stderr. Virtual addresses (0xFFFF, 0xFFFFFF, 0xFFFFFFFF) are
left untouched.

Examples:
  calscope replace worklist.csv --original build41.a2ldb --new build42.a2ldb
  calscope replace worklist.csv --original old.a2ldb --new new.a2ldb -o updated.csv")]
    Replace {
        /// Working list to reconcile
        list: PathBuf,

        /// Description the list's addresses were resolved against
        #[arg(long)]
        original: PathBuf,

        /// Description of the new software build
        #[arg(long = "new")]
        new_db: PathBuf,

        /// Output file (default: rewrite the list in place)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Suppress stderr miss lines and summary
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Materialize a working list as a description database
    #[command(after_help = "\
Examples:
  calscope convert worklist.csv -o worklist.a2ldb
  calscope convert worklist.csv -o worklist.a2ldb --force")]
    Convert {
        /// Working list to convert
        list: PathBuf,

        /// Output database path
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Overwrite an existing output file
        #[arg(long)]
        force: bool,

        /// Suppress the stderr summary
        #[arg(long, short = 'q')]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: calscope <command> [options]");
            eprintln!("       calscope --help for more information");
            Ok(())
        }
        Some(Commands::Search {
            description,
            text,
            field,
            position,
            max_items,
            batch_size,
            json,
            quiet,
            config,
        }) => config::CliConfig::load(config.as_deref()).and_then(|config| {
            search::cmd_search(
                search::SearchArgs {
                    description: &description,
                    text: &text,
                    field,
                    position,
                    max_items,
                    batch_size,
                    json,
                    quiet,
                },
                &config,
            )
        }),
        Some(Commands::Dupes { list, json, quiet }) => dupes::cmd_dupes(&list, json, quiet),
        Some(Commands::Replace { list, original, new_db, output, quiet }) => {
            replace::cmd_replace(&list, &original, &new_db, output.as_deref(), quiet)
        }
        Some(Commands::Convert { list, output, force, quiet }) => {
            convert::cmd_convert(&list, &output, force, quiet)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_LIST_IO, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_LIST_PARSE, message: msg.into(), hint: None }
    }

    /// Create error from a search error with proper exit code.
    pub fn search(err: SearchError) -> Self {
        let (code, hint) = match &err {
            SearchError::InvalidQuery(_) => (
                EXIT_SEARCH_INVALID_QUERY,
                Some("address searches take hex text, e.g. 0x1a00".to_string()),
            ),
            _ => (EXIT_SEARCH_BACKEND, None),
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Create error from a list IO error with proper exit code.
    pub fn list(err: ListIoError) -> Self {
        let hint = match &err {
            ListIoError::MissingColumn(_) => {
                Some("export the list from the editor to regenerate its header".to_string())
            }
            _ => None,
        };
        Self { code: list_exit_code(&err), message: err.to_string(), hint }
    }

    /// Create error from a reconciliation error with proper exit code.
    pub fn replace(err: ReconError) -> Self {
        Self { code: replace_exit_code(&err), message: err.to_string(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
