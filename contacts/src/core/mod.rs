//! Deterministic, pure logic shared by the contact store.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and plain strings and return deterministic outputs suitable for tests.

pub mod format;
pub mod phone;
pub mod types;
