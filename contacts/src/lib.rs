//! File-backed contact book.
//!
//! Contacts (name, phone, email) live in a single comma-delimited text file
//! that is the only source of truth. The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (line format, phone rule,
//!   outcomes). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (the contacts file, config).
//!
//! [`commands`] coordinates the two to implement the CLI.

pub mod commands;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
