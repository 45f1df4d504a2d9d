//! I/O helpers for contact commands.

pub mod config;
pub mod store;
