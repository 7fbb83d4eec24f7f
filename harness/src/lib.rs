//! End-to-end verification harness for freshly installed WSL guests.
//!
//! A scenario installs a distribution through its launcher, then checks the
//! guest from the outside: default user, language packs, release identity,
//! service manager state, and the release-upgrade policy across two reboots.
//!
//! - **[`core`]**: pure logic (expectation tables, structured-text parsing).
//! - **[`io`]**: side effects (process execution, config files, reports).
//!
//! [`scenario`] composes both into the ordered checklist, using
//! [`assertions`], [`verify`], [`poll`] and [`restart`] as building blocks.

pub mod assertions;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod poll;
pub mod report;
pub mod restart;
pub mod scenario;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod verify;
