//! Stable exit codes for `scriptlab` commands.

/// Script completed (and matched, when an expectation was given).
pub const OK: i32 = 0;
/// Script faulted, hit a limit, or printed something other than expected.
pub const FAILED: i32 = 1;
/// Bad arguments, unreadable input or invalid configuration.
pub const USAGE: i32 = 2;
