//! Deterministic, pure logic shared by the harness.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data (configuration values, captured guest text) and return deterministic
//! outputs suitable for tests.

pub mod expected;
pub mod structured;
pub mod types;
