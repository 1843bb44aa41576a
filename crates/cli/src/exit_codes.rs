//! CLI Exit Code Registry
//!
//! Single source of truth for all CLI exit codes. Exit codes are part of
//! the shell contract — scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                               |
//! |---------|-----------|-------------------------------------------|
//! | 0       | Universal | Success                                   |
//! | 1       | Universal | General error (unspecified)               |
//! | 2       | Universal | CLI usage error (bad args, missing file)  |
//! | 3-9     | search    | Query / description backend codes         |
//! | 10-19   | list      | Working-list file codes                   |
//! | 20-29   | dupes     | Duplicate-scan codes                      |
//! | 30-39   | replace   | Address reconciliation codes              |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
#[allow(dead_code)]
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Search (3-9)
// =============================================================================

/// Query text could not be interpreted (e.g. non-hex address search).
pub const EXIT_SEARCH_INVALID_QUERY: u8 = 3;

/// Description backend failed mid-search.
pub const EXIT_SEARCH_BACKEND: u8 = 4;

// =============================================================================
// List (10-19)
// =============================================================================

/// Working list is missing a required column.
pub const EXIT_LIST_MISSING_COLUMN: u8 = 10;

/// Working list could not be parsed.
pub const EXIT_LIST_PARSE: u8 = 11;

/// Working list could not be read or written.
pub const EXIT_LIST_IO: u8 = 12;

// =============================================================================
// Dupes (20-29)
// =============================================================================

/// Duplicate addresses found. Like `diff(1)` exit 1, a finding rather
/// than a failure.
pub const EXIT_DUPES_FOUND: u8 = 20;

// =============================================================================
// Replace (30-39)
// =============================================================================

/// Another reconciliation run already holds the reconciler.
pub const EXIT_REPLACE_BUSY: u8 = 30;

/// Description backend failed mid-reconciliation.
pub const EXIT_REPLACE_BACKEND: u8 = 31;

// =============================================================================
// Error-type mappings
// =============================================================================

use calscope_io::ListIoError;
use calscope_recon::ReconError;

/// Map a list IO error to its exit code.
pub fn list_exit_code(err: &ListIoError) -> u8 {
    match err {
        ListIoError::MissingColumn(_) => EXIT_LIST_MISSING_COLUMN,
        ListIoError::Csv(_) => EXIT_LIST_PARSE,
        ListIoError::Io(_) | ListIoError::Database(_) => EXIT_LIST_IO,
    }
}

/// Map a reconciliation error to its exit code.
pub fn replace_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::AlreadyRunning => EXIT_REPLACE_BUSY,
        ReconError::Backend(_) => EXIT_REPLACE_BACKEND,
    }
}
