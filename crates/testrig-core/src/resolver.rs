//! Symbolic version constants and their resolution strategies.
//!
//! Each constant maps to one resolution strategy with its own memo
//! slot: a constant is resolved through the feed at most once per
//! resolver instance, and the slots live on the instance rather than
//! in any global state.

use std::cell::OnceCell;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::feed::ReleaseFeed;
use crate::version::{self, Stability};

/// The closed set of symbolic core-version identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionConstant {
    /// Latest stable release of the oldest still-supported branch.
    OldestSupported,
    /// Latest stable release strictly below the current minor.
    PreviousMinor,
    /// Latest stable release overall.
    Current,
    /// Dev branch of the current minor.
    CurrentDev,
    /// Next release above current, alpha or later.
    NextMinor,
    /// Dev branch of the next release above current.
    NextMinorDev,
    /// Latest minor of the next major, beta or later.
    NextMajorBeta,
    /// Dev branch of the latest minor of the next major.
    NextMajorDev,
}

impl VersionConstant {
    /// All constants, in resolution-documentation order.
    pub const ALL: [VersionConstant; 8] = [
        VersionConstant::OldestSupported,
        VersionConstant::PreviousMinor,
        VersionConstant::Current,
        VersionConstant::CurrentDev,
        VersionConstant::NextMinor,
        VersionConstant::NextMinorDev,
        VersionConstant::NextMajorBeta,
        VersionConstant::NextMajorDev,
    ];

    /// The CLI spelling of this constant.
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionConstant::OldestSupported => "oldest-supported",
            VersionConstant::PreviousMinor => "previous-minor",
            VersionConstant::Current => "current",
            VersionConstant::CurrentDev => "current-dev",
            VersionConstant::NextMinor => "next-minor",
            VersionConstant::NextMinorDev => "next-minor-dev",
            VersionConstant::NextMajorBeta => "next-major-beta",
            VersionConstant::NextMajorDev => "next-major-dev",
        }
    }
}

impl fmt::Display for VersionConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionConstant {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        VersionConstant::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::InvalidArgument {
                option: "core".to_string(),
                value: s.to_string(),
                reason: "unknown symbolic version constant".to_string(),
            })
    }
}

/// Resolves symbolic version constants to concrete versions through a
/// release feed, memoizing each constant for the resolver's lifetime.
pub struct VersionResolver<'f> {
    feed: &'f dyn ReleaseFeed,
    platform: String,
    oldest_supported: OnceCell<String>,
    previous_minor: OnceCell<String>,
    current: OnceCell<String>,
    current_dev: OnceCell<String>,
    next_minor: OnceCell<String>,
    next_minor_dev: OnceCell<String>,
    next_major_beta: OnceCell<String>,
    next_major_dev: OnceCell<String>,
}

impl<'f> VersionResolver<'f> {
    /// Create a resolver querying releases of the given platform package.
    pub fn new(feed: &'f dyn ReleaseFeed, platform: impl Into<String>) -> Self {
        VersionResolver {
            feed,
            platform: platform.into(),
            oldest_supported: OnceCell::new(),
            previous_minor: OnceCell::new(),
            current: OnceCell::new(),
            current_dev: OnceCell::new(),
            next_minor: OnceCell::new(),
            next_minor_dev: OnceCell::new(),
            next_major_beta: OnceCell::new(),
            next_major_dev: OnceCell::new(),
        }
    }

    /// Resolve a symbolic constant to a concrete version.
    ///
    /// Idempotent per instance: the underlying feed is queried at most
    /// once per constant.
    pub fn resolve(&self, constant: VersionConstant) -> Result<String> {
        match constant {
            VersionConstant::OldestSupported => {
                self.memo(&self.oldest_supported, |r| r.query_oldest_supported())
            }
            VersionConstant::PreviousMinor => {
                self.memo(&self.previous_minor, |r| r.query_previous_minor())
            }
            VersionConstant::Current => self.memo(&self.current, |r| r.query_current()),
            VersionConstant::CurrentDev => {
                self.memo(&self.current_dev, |r| r.derive_current_dev())
            }
            VersionConstant::NextMinor => {
                self.memo(&self.next_minor, |r| r.query_next_minor(Stability::Alpha))
            }
            VersionConstant::NextMinorDev => self.memo(&self.next_minor_dev, |r| {
                let candidate = r.query_next_minor(Stability::Dev)?;
                Ok(version::dev_branch_of(&version::parse_loose(&candidate)?))
            }),
            VersionConstant::NextMajorBeta => {
                self.memo(&self.next_major_beta, |r| r.query_next_major(Stability::Beta))
            }
            VersionConstant::NextMajorDev => self.memo(&self.next_major_dev, |r| {
                let candidate = r.query_next_major(Stability::Dev)?;
                Ok(version::dev_branch_of(&version::parse_loose(&candidate)?))
            }),
        }
    }

    /// Resolve an arbitrary constraint at the given minimum stability.
    /// Not memoized; only the closed constants get slots.
    pub fn resolve_arbitrary(&self, constraint: &str, minimum: Stability) -> Result<String> {
        self.feed
            .best_candidate(&self.platform, constraint, minimum)?
            .ok_or_else(|| self.no_candidate(constraint, minimum))
    }

    fn memo(
        &self,
        slot: &OnceCell<String>,
        compute: impl FnOnce(&Self) -> Result<String>,
    ) -> Result<String> {
        if let Some(v) = slot.get() {
            return Ok(v.clone());
        }
        let v = compute(self)?;
        Ok(slot.get_or_init(|| v).clone())
    }

    /// Best stable release overall. Unresolvable `current` is a
    /// non-recoverable internal error: every other strategy depends on it.
    fn query_current(&self) -> Result<String> {
        self.feed
            .best_candidate(&self.platform, "*", Stability::Stable)?
            .ok_or(CoreError::CurrentUnresolvable)
    }

    fn query_oldest_supported(&self) -> Result<String> {
        let branches = self.feed.supported_branches()?;
        let branch = branches
            .iter()
            .find(|b| !b.ends_with("-legacy"))
            .ok_or_else(|| CoreError::Feed {
                detail: "supported-branches feed lists no non-legacy branch".to_string(),
            })?;
        // Wildcard form: the bare branch string parses with caret
        // semantics and admits newer minors of the same major.
        self.resolve_arbitrary(&format!("{branch}.*"), Stability::Stable)
    }

    fn query_previous_minor(&self) -> Result<String> {
        let current = self.resolve(VersionConstant::Current)?;
        let v = version::parse_loose(&current)?;
        let constraint = format!("<{}.{}", v.major, v.minor);
        self.resolve_arbitrary(&constraint, Stability::Stable)
    }

    fn derive_current_dev(&self) -> Result<String> {
        let current = self.resolve(VersionConstant::Current)?;
        Ok(version::dev_branch_of(&version::parse_loose(&current)?))
    }

    fn query_next_minor(&self, minimum: Stability) -> Result<String> {
        let current = self.resolve(VersionConstant::Current)?;
        let constraint = format!(">{current}");
        self.resolve_arbitrary(&constraint, minimum)
    }

    fn query_next_major(&self, minimum: Stability) -> Result<String> {
        let current = self.resolve(VersionConstant::Current)?;
        let next_major = version::parse_loose(&current)?.major + 1;
        let constraint = format!("^{next_major}");
        self.resolve_arbitrary(&constraint, minimum)
    }

    fn no_candidate(&self, constraint: &str, stability: Stability) -> CoreError {
        CoreError::NoCandidate {
            package: self.platform.clone(),
            constraint: constraint.to_string(),
            stability,
        }
    }
}
