//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! | Code | Meaning                                      |
//! |------|----------------------------------------------|
//! | 0    | Success                                      |
//! | 1    | General error (unspecified)                  |
//! | 2    | Usage error (bad args, missing file)         |
//! | 10   | Invalid configuration                        |
//! | 11   | Runtime failure (load, fetch, engine)        |
//! | 12   | Apply completed with write errors            |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Configuration parsed but failed validation, or did not parse at all.
pub const EXIT_INVALID_CONFIG: u8 = 10;

/// Snapshot/API load failure or an engine runtime error.
pub const EXIT_RUNTIME: u8 = 11;

/// The run or review apply finished, but some writes were rejected.
pub const EXIT_APPLY_ERRORS: u8 = 12;
