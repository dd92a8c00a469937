//! Package model: identity, install path, and the core-version matrix.
//!
//! A package carries a static default version pair plus an ordered list
//! of core-version-conditioned overrides. Matrix constraints are parsed
//! once at construction; matching is first-match-wins in config order.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::version::{self, VersionReq};

/// Separator between vendor and package name.
pub const NAME_SEPARATOR: char = '/';

/// Fallback version when a package declares no static default.
pub const DEFAULT_VERSION: &str = "*";

/// Fallback dev version when a package declares no static default.
pub const DEFAULT_VERSION_DEV: &str = "*@dev";

/// Package kind, driving the install-path template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    /// Regular extension module, installed under `packages/`.
    Module,
    /// Theme package, installed under `themes/`.
    Theme,
    /// Support library, installed under `lib/`.
    Library,
    /// The platform itself.
    Platform,
}

impl PackageKind {
    /// Lowercase label matching the config spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageKind::Module => "module",
            PackageKind::Theme => "theme",
            PackageKind::Library => "library",
            PackageKind::Platform => "platform",
        }
    }

    fn path_template(&self, short: &str) -> String {
        match self {
            PackageKind::Module => format!("packages/{short}"),
            PackageKind::Theme => format!("themes/{short}"),
            PackageKind::Library => format!("lib/{short}"),
            PackageKind::Platform => "platform".to_string(),
        }
    }
}

/// One core-matrix row as it appears in a config source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixEntryConfig {
    /// Core-version constraint (semver range syntax).
    pub core: String,
    /// Recommended-version override for matching cores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Dev-version override for matching cores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_dev: Option<String>,
}

/// A package entry in a config source. Every field is optional so the
/// alter-merge can distinguish "unspecified" from an explicit value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PackageKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_dev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_matrix: Option<Vec<MatrixEntryConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_core_package: Option<bool>,
}

impl PackageConfig {
    /// Override fields from `other` where it specifies them. A supplied
    /// matrix replaces the existing one wholesale; rows never merge.
    pub fn merge_from(&mut self, other: &PackageConfig) {
        if other.kind.is_some() {
            self.kind = other.kind;
        }
        if other.install_path.is_some() {
            self.install_path = other.install_path.clone();
        }
        if other.repository.is_some() {
            self.repository = other.repository.clone();
        }
        if other.version.is_some() {
            self.version = other.version.clone();
        }
        if other.version_dev.is_some() {
            self.version_dev = other.version_dev.clone();
        }
        if other.core_matrix.is_some() {
            self.core_matrix = other.core_matrix.clone();
        }
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.is_core_package.is_some() {
            self.is_core_package = other.is_core_package;
        }
    }
}

/// One parsed core-matrix row.
#[derive(Debug, Clone)]
struct MatrixEntry {
    req: VersionReq,
    version: Option<String>,
    version_dev: Option<String>,
}

/// A package definition, immutable after construction.
#[derive(Debug, Clone)]
pub struct Package {
    /// Full `vendor/name` identity.
    pub name: String,
    /// Kind, drives the default install path.
    pub kind: PackageKind,
    /// Explicit install path, overriding the kind template.
    install_path: Option<String>,
    /// Source repository location, when not on the default registry.
    pub repository: Option<String>,
    /// Static default recommended version.
    pub default_version: String,
    /// Static default dev version.
    pub default_version_dev: String,
    /// Ordered core matrix; first matching row wins.
    matrix: Vec<MatrixEntry>,
    /// Whether the package participates in composition at all.
    pub enabled: bool,
    /// Whether this is the distinguished platform package.
    pub is_core_package: bool,
}

impl Package {
    /// Build a package from a config entry, validating the name and
    /// parsing every matrix constraint.
    pub fn from_config(name: &str, cfg: &PackageConfig) -> Result<Self> {
        if !name.contains(NAME_SEPARATOR) || name.starts_with(NAME_SEPARATOR) {
            return Err(CoreError::InvalidPackageName {
                name: name.to_string(),
            });
        }

        let mut matrix = Vec::new();
        for entry in cfg.core_matrix.as_deref().unwrap_or_default() {
            let req = version::parse_requirement(&entry.core).map_err(|e| {
                CoreError::InvalidConstraint {
                    context: name.to_string(),
                    constraint: entry.core.clone(),
                    detail: e.to_string(),
                }
            })?;
            matrix.push(MatrixEntry {
                req,
                version: entry.version.clone(),
                version_dev: entry.version_dev.clone(),
            });
        }

        Ok(Package {
            name: name.to_string(),
            kind: cfg.kind.unwrap_or(PackageKind::Module),
            install_path: cfg.install_path.clone(),
            repository: cfg.repository.clone(),
            default_version: cfg
                .version
                .clone()
                .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            default_version_dev: cfg
                .version_dev
                .clone()
                .unwrap_or_else(|| DEFAULT_VERSION_DEV.to_string()),
            matrix,
            enabled: cfg.enabled.unwrap_or(true),
            is_core_package: cfg.is_core_package.unwrap_or(false),
        })
    }

    /// The built-in platform default, used when the merged registry
    /// lacks the platform package.
    pub(crate) fn platform_fallback(name: &str) -> Package {
        Package {
            name: name.to_string(),
            kind: PackageKind::Platform,
            install_path: None,
            repository: None,
            default_version: DEFAULT_VERSION.to_string(),
            default_version_dev: DEFAULT_VERSION_DEV.to_string(),
            matrix: Vec::new(),
            enabled: true,
            is_core_package: true,
        }
    }

    /// The name part after the vendor separator.
    pub fn short_name(&self) -> &str {
        match self.name.split_once(NAME_SEPARATOR) {
            Some((_, short)) => short,
            None => &self.name,
        }
    }

    /// Install path relative to the fixture root: the explicit path
    /// when configured, the kind template otherwise.
    pub fn install_path(&self) -> String {
        match &self.install_path {
            Some(path) => path.clone(),
            None => self.kind.path_template(self.short_name()),
        }
    }

    /// The recommended version for the given core version, or the
    /// static default when no core is given or no matrix row matches.
    pub fn recommended_version(&self, core: Option<&str>) -> Result<String> {
        match self.matrix_match(core)? {
            Some(entry) => Ok(entry
                .version
                .clone()
                .unwrap_or_else(|| self.default_version.clone())),
            None => Ok(self.default_version.clone()),
        }
    }

    /// The dev version for the given core version, same fallback rules.
    pub fn dev_version(&self, core: Option<&str>) -> Result<String> {
        match self.matrix_match(core)? {
            Some(entry) => Ok(entry
                .version_dev
                .clone()
                .unwrap_or_else(|| self.default_version_dev.clone())),
            None => Ok(self.default_version_dev.clone()),
        }
    }

    /// First matrix row admitting the core version, in config order. A
    /// row supplying only one field does NOT chain to later rows for
    /// the other; the fallback is always the static default.
    fn matrix_match(&self, core: Option<&str>) -> Result<Option<&MatrixEntry>> {
        let Some(core) = core else {
            return Ok(None);
        };
        let core = version::parse_loose(core)?;
        Ok(self
            .matrix
            .iter()
            .find(|entry| version::matches_loose(&core, &entry.req)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(json: &str) -> PackageConfig {
        serde_json::from_str(json).unwrap()
    }

    fn package(json: &str) -> Package {
        Package::from_config("vendor/demo", &config(json)).unwrap()
    }

    #[test]
    fn static_defaults_without_core() {
        let pkg = package("{}");
        assert_eq!(pkg.recommended_version(None).unwrap(), "*");
        assert_eq!(pkg.dev_version(None).unwrap(), "*@dev");
    }

    #[test]
    fn explicit_static_versions() {
        let pkg = package(r#"{"version": "^2.0", "version_dev": "2.x-dev"}"#);
        assert_eq!(pkg.recommended_version(None).unwrap(), "^2.0");
        assert_eq!(pkg.dev_version(None).unwrap(), "2.x-dev");
    }

    #[test]
    fn matrix_first_match_wins() {
        let pkg = package(
            r#"{
                "version": "^1.0",
                "core_matrix": [
                    {"core": "9.1.*", "version": "^3.0"},
                    {"core": "^9", "version": "^2.0"}
                ]
            }"#,
        );
        // 9.1.4 matches both rows; the first wins.
        assert_eq!(pkg.recommended_version(Some("9.1.4")).unwrap(), "^3.0");
        // 9.2.0 only matches the second.
        assert_eq!(pkg.recommended_version(Some("9.2.0")).unwrap(), "^2.0");
        // 10.0.0 matches nothing: static default.
        assert_eq!(pkg.recommended_version(Some("10.0.0")).unwrap(), "^1.0");
    }

    #[test]
    fn partial_entry_falls_back_to_static_default() {
        // The matching row supplies only version_dev; the recommended
        // version comes from the static default, not from the later row
        // that does define one.
        let pkg = package(
            r#"{
                "version": "^1.0",
                "version_dev": "1.x-dev",
                "core_matrix": [
                    {"core": "9.1.*", "version_dev": "3.x-dev"},
                    {"core": "^9", "version": "^2.0", "version_dev": "2.x-dev"}
                ]
            }"#,
        );
        assert_eq!(pkg.recommended_version(Some("9.1.4")).unwrap(), "^1.0");
        assert_eq!(pkg.dev_version(Some("9.1.4")).unwrap(), "3.x-dev");
    }

    #[test]
    fn matrix_admits_dev_core_versions() {
        let pkg = package(
            r#"{"core_matrix": [{"core": "9.1.*", "version": "^3.0"}]}"#,
        );
        assert_eq!(pkg.recommended_version(Some("9.1.x-dev")).unwrap(), "^3.0");
    }

    #[test]
    fn matrix_comparison_pair_constraints() {
        let pkg = package(
            r#"{"core_matrix": [{"core": ">=9.0, <9.2", "version": "^2.0"}]}"#,
        );
        assert_eq!(pkg.recommended_version(Some("9.1.0")).unwrap(), "^2.0");
        assert_eq!(pkg.recommended_version(Some("9.2.0")).unwrap(), "*");
    }

    #[test]
    fn invalid_matrix_constraint_rejected_at_construction() {
        let result = Package::from_config(
            "vendor/demo",
            &config(r#"{"core_matrix": [{"core": "not a range"}]}"#),
        );
        assert!(matches!(
            result,
            Err(CoreError::InvalidConstraint { .. })
        ));
    }

    #[test]
    fn unparseable_core_version_is_an_error() {
        let pkg = package(r#"{"core_matrix": [{"core": "^9"}]}"#);
        assert!(matches!(
            pkg.recommended_version(Some("garbage")),
            Err(CoreError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn name_requires_separator() {
        assert!(matches!(
            Package::from_config("noseparator", &PackageConfig::default()),
            Err(CoreError::InvalidPackageName { .. })
        ));
        assert!(Package::from_config("vendor/ok", &PackageConfig::default()).is_ok());
    }

    #[test]
    fn install_path_templates() {
        let module = package(r#"{"kind": "module"}"#);
        assert_eq!(module.install_path(), "packages/demo");

        let theme = package(r#"{"kind": "theme"}"#);
        assert_eq!(theme.install_path(), "themes/demo");

        let lib = package(r#"{"kind": "library"}"#);
        assert_eq!(lib.install_path(), "lib/demo");

        let platform = package(r#"{"kind": "platform"}"#);
        assert_eq!(platform.install_path(), "platform");

        let explicit = package(r#"{"install_path": "custom/here"}"#);
        assert_eq!(explicit.install_path(), "custom/here");
    }

    #[test]
    fn merge_overrides_fields_and_replaces_matrix() {
        let mut base = config(
            r#"{
                "version": "^1.0",
                "enabled": true,
                "core_matrix": [{"core": "^9", "version": "^2.0"}]
            }"#,
        );
        let alter = config(
            r#"{
                "version": "^5.0",
                "core_matrix": [{"core": "^10", "version": "^6.0"}]
            }"#,
        );
        base.merge_from(&alter);

        assert_eq!(base.version.as_deref(), Some("^5.0"));
        assert_eq!(base.enabled, Some(true));
        let matrix = base.core_matrix.unwrap();
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix[0].core, "^10");
    }

    #[test]
    fn merge_leaves_unspecified_fields() {
        let mut base = config(r#"{"version": "^1.0", "repository": "https://example.org/demo.git"}"#);
        base.merge_from(&config(r#"{"enabled": false}"#));
        assert_eq!(base.version.as_deref(), Some("^1.0"));
        assert_eq!(base.repository.as_deref(), Some("https://example.org/demo.git"));
        assert_eq!(base.enabled, Some(false));
    }
}
