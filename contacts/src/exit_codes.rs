//! Stable exit codes for contacts CLI commands.

/// Command succeeded (including a declined delete confirmation).
pub const OK: i32 = 0;
/// Command failed due to I/O, config, or invalid input.
pub const ERROR: i32 = 1;
/// The store rejected the request (duplicate, invalid phone, not found).
pub const REJECTED: i32 = 2;
