//! `testrig.toml` manifest parsing and project configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use testrig_core::{FileFeed, PackageRegistry, PLATFORM_PACKAGE};
use testrig_runner::{CommandServer, Framework, ServerSet};

/// The top-level manifest structure for a testrig project.
#[derive(Debug, Clone, Deserialize)]
pub struct RigManifest {
    /// Fixture location and reset behavior (required).
    pub fixture: FixtureConfig,
    /// Registry and release-feed file locations (required).
    pub registry: RegistryConfig,
    /// External package manager.
    #[serde(rename = "package-manager")]
    pub package_manager: PackageManagerConfig,
    /// Test frameworks, in run order.
    #[serde(default, rename = "framework")]
    pub frameworks: Vec<Framework>,
    /// Background servers bracketing a test batch.
    #[serde(default)]
    pub servers: Option<ServersConfig>,
}

/// Fixture section.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureConfig {
    /// Fixture directory, relative to the project root.
    #[serde(default = "default_fixture_dir")]
    pub dir: String,
    /// Reset command run in the fixture root before each package.
    #[serde(default)]
    pub reset: Option<Vec<String>>,
}

fn default_fixture_dir() -> String {
    "fixture".to_string()
}

/// Registry section: where the config sources live.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Primary package config file (JSON).
    pub packages: String,
    /// Optional alter config file merged over the primary.
    #[serde(default)]
    pub alter: Option<String>,
    /// Release feed file (JSON).
    pub releases: String,
    /// Platform package name override.
    #[serde(default)]
    pub platform: Option<String>,
}

/// Package-manager section.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageManagerConfig {
    /// Program name or path.
    pub program: String,
}

/// Servers section: command lines for the batch-scoped servers.
#[derive(Debug, Clone, Deserialize)]
pub struct ServersConfig {
    #[serde(default)]
    pub web: Option<Vec<String>>,
    #[serde(default)]
    pub browser: Option<Vec<String>>,
}

impl RigManifest {
    /// Search upward from `start_dir` for a `testrig.toml` file, parse
    /// and return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join("testrig.toml");
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: RigManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing testrig.toml")
    }

    /// The platform package name.
    pub fn platform(&self) -> &str {
        self.registry.platform.as_deref().unwrap_or(PLATFORM_PACKAGE)
    }

    /// The fixture directory under the project root.
    pub fn fixture_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.fixture.dir)
    }

    /// Load and merge the package registry from the configured sources.
    pub fn load_registry(&self, project_dir: &Path) -> Result<PackageRegistry> {
        let base = project_dir.join(&self.registry.packages);
        let alter = self.registry.alter.as_ref().map(|p| project_dir.join(p));
        PackageRegistry::load_with_alter(&base, alter.as_deref())
            .with_context(|| format!("loading registry from {}", base.display()))
    }

    /// Load the release feed from the configured source.
    pub fn load_feed(&self, project_dir: &Path) -> Result<FileFeed> {
        let path = project_dir.join(&self.registry.releases);
        FileFeed::load(&path).with_context(|| format!("loading releases from {}", path.display()))
    }

    /// The configured background servers, in start order.
    pub fn server_set(&self) -> ServerSet {
        let mut set = ServerSet::new();
        if let Some(servers) = &self.servers {
            if let Some(command) = &servers.web {
                set.push(Box::new(CommandServer::new("web", command.clone())));
            }
            if let Some(command) = &servers.browser {
                set.push(Box::new(CommandServer::new("browser", command.clone())));
            }
        }
        set
    }
}
