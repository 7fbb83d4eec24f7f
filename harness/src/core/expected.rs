//! Expected guest state derived from the variant under test.
//!
//! Every function here is a pure function of the variant identifier (the
//! distro name the launcher registers). Nothing is cached: callers pass the
//! current configuration value at each call site.

use crate::core::types::UpgradePolicy;

/// Release string of the development series shipped by the preview channels.
pub const DEVELOPMENT_RELEASE: &str = "Ubuntu Kinetic Kudu (development branch)";

/// Expected `PRETTY_NAME` of `/etc/os-release` for a variant.
///
/// Returns `None` for variants the harness does not know how to check.
pub fn expected_release(variant: &str) -> Option<&'static str> {
    match variant {
        "Ubuntu-Preview" | "UbuntuDev.WslID.Dev" => Some(DEVELOPMENT_RELEASE),
        "Ubuntu" | "Ubuntu22.04LTS" => Some("Ubuntu 22.04.1 LTS"),
        "Ubuntu20.04LTS" => Some("Ubuntu 20.04.5 LTS"),
        "Ubuntu18.04LTS" => Some("Ubuntu 18.04.6 LTS"),
        _ => None,
    }
}

/// Expected `Prompt` policy of `/etc/update-manager/release-upgrades`.
///
/// - the rolling `Ubuntu` app follows LTS upgrades;
/// - pinned `Ubuntu<version>LTS` apps never upgrade;
/// - preview and development apps follow every release.
pub fn expected_upgrade_policy(variant: &str) -> UpgradePolicy {
    if variant == "Ubuntu" {
        return UpgradePolicy::Lts;
    }
    if variant.starts_with("Ubuntu") && variant.ends_with("LTS") {
        return UpgradePolicy::Never;
    }
    UpgradePolicy::Normal
}
