//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// - 0: Success
/// - 1: General error
/// - 2: Misuse of shell command (reserved by shells and clap)
/// - 3+: Application-specific errors
pub mod exit_codes {
    pub const GENERAL: i32 = 1;

    /// Resource not found (config, storage path, key).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or configuration.
    pub const INVALID_INPUT: i32 = 4;
}
