//! Version parsing and selection helpers.
//!
//! Wraps the `semver` crate with the loose parsing rules used by the
//! release feed and the core matrix: `v` prefixes, short versions like
//! `9.1`, and dev-branch suffixes like `9.1.x-dev`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A parsed semantic version.
pub type Version = semver::Version;

/// A version requirement (range expression).
pub type VersionReq = semver::VersionReq;

/// Release stability, ordered from least to most stable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Stability {
    /// Development snapshot (`-dev`, `x-dev` branches).
    Dev,
    /// Alpha pre-release.
    Alpha,
    /// Beta pre-release.
    Beta,
    /// Release candidate.
    Rc,
    /// Tagged stable release.
    Stable,
}

impl Stability {
    /// Classify a version by its pre-release tag.
    ///
    /// Unknown tags are treated as dev-channel, the least stable level.
    pub fn of(version: &Version) -> Stability {
        let pre = version.pre.as_str();
        if pre.is_empty() {
            Stability::Stable
        } else if pre.starts_with("rc") {
            Stability::Rc
        } else if pre.starts_with("beta") {
            Stability::Beta
        } else if pre.starts_with("alpha") {
            Stability::Alpha
        } else {
            Stability::Dev
        }
    }
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stability::Dev => "dev",
            Stability::Alpha => "alpha",
            Stability::Beta => "beta",
            Stability::Rc => "rc",
            Stability::Stable => "stable",
        };
        f.write_str(s)
    }
}

/// Parse a version string, accepting the loose forms seen in release
/// feeds: an optional `v` prefix, fewer than three segments (`9.1` →
/// `9.1.0`), and dev-branch suffixes (`9.1.x-dev` → `9.1.0-dev`).
pub fn parse_loose(input: &str) -> Result<Version> {
    let trimmed = input.trim();
    let s = trimmed.strip_prefix('v').unwrap_or(trimmed);

    let normalized = if let Some(prefix) = s.strip_suffix(".x-dev") {
        match prefix.matches('.').count() {
            0 => format!("{prefix}.0.0-dev"),
            _ => format!("{prefix}.0-dev"),
        }
    } else {
        pad_segments(s)
    };

    Version::parse(&normalized).map_err(|_| CoreError::InvalidVersion {
        version: input.to_string(),
    })
}

/// Pad `X` and `X.Y` forms to full three-segment versions, preserving
/// any pre-release or build suffix.
fn pad_segments(s: &str) -> String {
    let split_at = s.find(['-', '+']).unwrap_or(s.len());
    let (base, suffix) = s.split_at(split_at);
    match base.matches('.').count() {
        0 => format!("{base}.0.0{suffix}"),
        1 => format!("{base}.0{suffix}"),
        _ => s.to_string(),
    }
}

/// Parse a version requirement string like `^9.1`, `9.1.*`, `~9.1.0`,
/// or `>=9.0, <10` (exact versions included).
pub fn parse_requirement(s: &str) -> std::result::Result<VersionReq, semver::Error> {
    VersionReq::parse(s)
}

/// Check whether a version satisfies a requirement, with one relaxation
/// over plain semver: when the requirement names no pre-release, a
/// pre-release version is also tried with its pre-release stripped, so
/// `9.1.*` admits `9.1.0-dev`.
pub fn matches_loose(version: &Version, req: &VersionReq) -> bool {
    if req.matches(version) {
        return true;
    }
    if !version.pre.is_empty() && req.comparators.iter().all(|c| c.pre.is_empty()) {
        let released = Version::new(version.major, version.minor, version.patch);
        return req.matches(&released);
    }
    false
}

/// Select the highest version matching the requirement at or above the
/// given minimum stability.
pub fn resolve_best(
    available: &[Version],
    req: &VersionReq,
    minimum: Stability,
) -> Option<Version> {
    available
        .iter()
        .filter(|v| Stability::of(v) >= minimum && matches_loose(v, req))
        .max()
        .cloned()
}

/// The dev-channel branch for a version: `9.1.3` → `9.1.x-dev`.
pub fn dev_branch_of(version: &Version) -> String {
    format!("{}.{}.x-dev", version.major, version.minor)
}

/// True iff the string is a single concrete version, not a range.
pub fn is_exact(s: &str) -> bool {
    Version::parse(s.trim()).is_ok()
}
