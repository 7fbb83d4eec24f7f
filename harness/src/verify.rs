//! Structured-state verification: fetch a guest file, read a key, compare.
//!
//! The raw text is always logged next to the parsed value before anything is
//! asserted. A key sitting in the unnamed section instead of a named one is a
//! recurring cause of failures, and the log is the only record of what the
//! guest actually returned.

use tracing::{error, info};

use crate::assertions::Asserter;
use crate::core::structured::parse_key;
use crate::core::types::ExecutionContext;
use crate::error::ScenarioError;
use crate::io::executor::Executor;

/// A key read from a guest file, together with the text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyReading {
    pub raw: String,
    pub value: String,
}

/// `cat` `path` inside the guest and read `key` from `section`.
pub fn read_guest_key<E: Executor + ?Sized>(
    asserter: &Asserter<'_, E>,
    path: &str,
    section: &str,
    key: &str,
) -> Result<KeyReading, ScenarioError> {
    let raw = asserter.assert_execute(ExecutionContext::Guest, &["cat", path])?;
    match parse_key(&raw, section, key) {
        Ok(value) => {
            info!(path, section, key, value = %value, raw = %raw, "read guest key");
            Ok(KeyReading { raw, value })
        }
        Err(source) => {
            error!(path, section, key, err = %source, raw = %raw, "cannot read guest key");
            Err(ScenarioError::State {
                source_name: path.to_string(),
                raw,
                source,
            })
        }
    }
}

/// Compare a parsed value with its expectation.
///
/// A mismatch logs raw text, parsed value and expected value side by side.
pub fn compare_against_expected(
    what: &str,
    reading: &KeyReading,
    expected: &str,
) -> Result<(), ScenarioError> {
    if reading.value == expected {
        return Ok(());
    }
    error!(
        what,
        raw = %reading.raw,
        parsed = %reading.value,
        expected,
        "unexpected value"
    );
    Err(ScenarioError::Mismatch {
        what: what.to_string(),
        raw: reading.raw.clone(),
        observed: reading.value.clone(),
        expected: expected.to_string(),
    })
}
