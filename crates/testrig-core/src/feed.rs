//! Release feed trait and file-backed implementation.
//!
//! The `ReleaseFeed` trait abstracts over the remote best-candidate
//! query service and the supported-branches feed. The `FileFeed`
//! provides a JSON-file-backed feed for development and testing.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::version::{self, Stability, Version};

/// Abstract release feed.
///
/// Implementations answer best-candidate queries and expose the ordered
/// list of supported core branches.
pub trait ReleaseFeed {
    /// Find the best (highest) release of `package` matching
    /// `constraint` at or above `minimum` stability. `Ok(None)` means
    /// no candidate exists; that is an ordinary condition, not an error.
    fn best_candidate(
        &self,
        package: &str,
        constraint: &str,
        minimum: Stability,
    ) -> Result<Option<String>>;

    /// The ordered list of supported core branches. Legacy branches
    /// carry a `-legacy` suffix on the entry.
    fn supported_branches(&self) -> Result<Vec<String>>;
}

/// A JSON-file-backed release feed for development and testing.
///
/// Format:
/// ```json
/// {
///   "branches": "9.1, 9.0, 8.7-legacy",
///   "releases": {
///     "platform/core": ["8.7.30", "9.0.0", "9.1.0", "9.2.x-dev"]
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFeed {
    /// Comma-separated branch list, newest first is not assumed; the
    /// feed order is authoritative.
    #[serde(default)]
    branches: String,
    /// Available release version strings per package.
    #[serde(default)]
    releases: BTreeMap<String, Vec<String>>,
}

impl FileFeed {
    /// Parse a feed from a JSON string.
    pub fn parse(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Load a feed from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    fn versions_of(&self, package: &str) -> Result<Vec<Version>> {
        let Some(listed) = self.releases.get(package) else {
            return Ok(Vec::new());
        };
        let mut versions = Vec::with_capacity(listed.len());
        for raw in listed {
            versions.push(version::parse_loose(raw)?);
        }
        Ok(versions)
    }
}

impl ReleaseFeed for FileFeed {
    fn best_candidate(
        &self,
        package: &str,
        constraint: &str,
        minimum: Stability,
    ) -> Result<Option<String>> {
        let req = version::parse_requirement(constraint).map_err(|e| {
            CoreError::InvalidConstraint {
                context: package.to_string(),
                constraint: constraint.to_string(),
                detail: e.to_string(),
            }
        })?;
        let available = self.versions_of(package)?;
        Ok(version::resolve_best(&available, &req, minimum).map(|v| v.to_string()))
    }

    fn supported_branches(&self) -> Result<Vec<String>> {
        Ok(self
            .branches
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect())
    }
}
