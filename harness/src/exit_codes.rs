//! Stable exit codes for harness CLI commands.

/// Command succeeded or the scenario passed.
pub const OK: i32 = 0;
/// Invalid config, arguments, or an I/O error outside the scenario.
pub const INVALID: i32 = 1;
/// `harness run` completed and at least one step failed.
pub const FAILED: i32 = 2;
