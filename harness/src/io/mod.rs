//! I/O helpers for harness commands.

pub mod config;
pub mod executor;
pub mod process;
pub mod report_store;
