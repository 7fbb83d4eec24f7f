//! Key lookup in INI-style text captured from the guest.
//!
//! Parsing itself is delegated to `rust-ini`. This module only decides how
//! sections resolve and how failures are classified.

use ini::{Ini, ParseOption};
use thiserror::Error;

/// Name under which keys outside any `[section]` header are addressed.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Why a key could not be read from structured text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuredTextError {
    #[error("malformed structured text: {0}")]
    Parse(String),
    #[error("key {key:?} not found in section [{section}]")]
    KeyNotFound { section: String, key: String },
}

impl StructuredTextError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StructuredTextError::KeyNotFound { .. })
    }
}

/// Read `key` from `section` of `text`.
///
/// `DEFAULT` matches an explicit `[DEFAULT]` header first and then the
/// unnamed leading section, so both `/etc/update-manager/release-upgrades`
/// and the header-less `/etc/os-release` resolve. A key repeated within a
/// section takes its last value. Surrounding quotes are stripped; backslashes
/// are kept as written.
pub fn parse_key(text: &str, section: &str, key: &str) -> Result<String, StructuredTextError> {
    let options = ParseOption {
        enabled_quote: true,
        enabled_escape: false,
        ..ParseOption::default()
    };
    let document = Ini::load_from_str_opt(text, options)
        .map_err(|err| StructuredTextError::Parse(err.to_string()))?;

    let named = document.section(Some(section));
    let unnamed = if section == DEFAULT_SECTION {
        document.section(None::<String>)
    } else {
        None
    };

    named
        .into_iter()
        .chain(unnamed)
        .find_map(|properties| properties.get_all(key).last())
        .map(|value| value.trim().to_string())
        .ok_or_else(|| StructuredTextError::KeyNotFound {
            section: section.to_string(),
            key: key.to_string(),
        })
}
