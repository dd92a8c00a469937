//! Package registry: load, alter-merge, and lookup.
//!
//! Config sources are JSON objects mapping package name to a field set
//! or an explicit `null`. The three states — absent, null, present —
//! stay distinct through the merge: null deletes, a field set overrides
//! field-by-field, an absent name leaves the base entry untouched.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::package::{Package, PackageConfig};

/// The distinguished platform package, always resolvable.
pub const PLATFORM_PACKAGE: &str = "platform/core";

type ConfigMap = BTreeMap<String, Option<PackageConfig>>;

/// Name-keyed collection of packages, sorted for deterministic
/// enumeration.
#[derive(Debug, Clone)]
pub struct PackageRegistry {
    packages: BTreeMap<String, Package>,
}

impl PackageRegistry {
    /// Parse a registry from a primary JSON config source.
    pub fn parse(base: &str) -> Result<Self> {
        Self::build(parse_map(base)?)
    }

    /// Parse and merge a primary and an alter config source.
    pub fn parse_with_alter(base: &str, alter: &str) -> Result<Self> {
        let mut map = parse_map(base)?;
        for (name, entry) in parse_map(alter)? {
            match entry {
                // Explicit null: delete the package from the result.
                None => {
                    map.insert(name, None);
                }
                Some(cfg) => match map.get_mut(&name) {
                    Some(Some(existing)) => existing.merge_from(&cfg),
                    // Base entry was null or absent: the alter entry
                    // stands on its own.
                    _ => {
                        map.insert(name, Some(cfg));
                    }
                },
            }
        }
        Self::build(map)
    }

    /// Load a registry from a primary config file.
    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Load a registry from a primary config file plus an optional
    /// alter file.
    pub fn load_with_alter(base: &Path, alter: Option<&Path>) -> Result<Self> {
        let base_content = std::fs::read_to_string(base)?;
        match alter {
            Some(alter) => {
                let alter_content = std::fs::read_to_string(alter)?;
                Self::parse_with_alter(&base_content, &alter_content)
            }
            None => Self::parse(&base_content),
        }
    }

    fn build(map: ConfigMap) -> Result<Self> {
        let mut packages = BTreeMap::new();
        for (name, entry) in map {
            // Entries still null after merging were explicitly deleted.
            if let Some(cfg) = entry {
                let package = Package::from_config(&name, &cfg)?;
                packages.insert(name, package);
            }
        }
        Ok(PackageRegistry { packages })
    }

    /// Look up a package by name. Missing packages are a fatal
    /// condition for the caller.
    pub fn get(&self, name: &str) -> Result<&Package> {
        self.packages.get(name).ok_or_else(|| CoreError::NoSuchPackage {
            name: name.to_string(),
        })
    }

    /// Whether a package is present.
    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// All packages in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// Number of packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// The platform package. Composition depends unconditionally on
    /// this resolving, so a built-in default stands in when the merged
    /// registry lacks it.
    pub fn platform_package(&self) -> Package {
        match self.packages.get(PLATFORM_PACKAGE) {
            Some(pkg) => pkg.clone(),
            None => Package::platform_fallback(PLATFORM_PACKAGE),
        }
    }
}

fn parse_map(input: &str) -> Result<ConfigMap> {
    Ok(serde_json::from_str(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageKind;

    const BASE: &str = r#"{
        "platform/core": {"kind": "platform", "is_core_package": true},
        "vendor/alpha": {"version": "^1.0", "core_matrix": [{"core": "^9", "version": "^2.0"}]},
        "vendor/beta": {"kind": "theme", "enabled": false},
        "vendor/gamma": {"version": "^3.0"}
    }"#;

    #[test]
    fn parse_base_registry() {
        let registry = PackageRegistry::parse(BASE).unwrap();
        assert_eq!(registry.len(), 4);
        assert!(registry.contains("vendor/alpha"));
        assert_eq!(registry.get("vendor/beta").unwrap().enabled, false);
    }

    #[test]
    fn enumeration_is_name_sorted() {
        let registry = PackageRegistry::parse(BASE).unwrap();
        let names: Vec<&str> = registry.iter().map(|p| p.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn missing_package_is_fatal() {
        let registry = PackageRegistry::parse(BASE).unwrap();
        assert!(matches!(
            registry.get("vendor/none"),
            Err(CoreError::NoSuchPackage { .. })
        ));
    }

    #[test]
    fn alter_null_deletes() {
        let registry =
            PackageRegistry::parse_with_alter(BASE, r#"{"vendor/gamma": null}"#).unwrap();
        assert!(!registry.contains("vendor/gamma"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn alter_overrides_fields() {
        let alter = r#"{
            "vendor/alpha": {
                "version": "^9.9",
                "core_matrix": [{"core": "^10", "version": "^10.0"}]
            }
        }"#;
        let registry = PackageRegistry::parse_with_alter(BASE, alter).unwrap();

        let alpha = registry.get("vendor/alpha").unwrap();
        assert_eq!(alpha.default_version, "^9.9");
        // Matrix replaced wholesale: the ^9 row is gone.
        assert_eq!(alpha.recommended_version(Some("9.1.0")).unwrap(), "^9.9");
        assert_eq!(alpha.recommended_version(Some("10.1.0")).unwrap(), "^10.0");
    }

    #[test]
    fn alter_leaves_absent_names_untouched() {
        let registry =
            PackageRegistry::parse_with_alter(BASE, r#"{"vendor/gamma": {"enabled": false}}"#)
                .unwrap();
        let alpha = registry.get("vendor/alpha").unwrap();
        assert_eq!(alpha.default_version, "^1.0");
        assert!(!registry.get("vendor/gamma").unwrap().enabled);
    }

    #[test]
    fn alter_can_introduce_new_packages() {
        let registry = PackageRegistry::parse_with_alter(
            BASE,
            r#"{"vendor/delta": {"version": "^4.0"}}"#,
        )
        .unwrap();
        assert_eq!(registry.get("vendor/delta").unwrap().default_version, "^4.0");
    }

    #[test]
    fn platform_package_from_registry() {
        let registry = PackageRegistry::parse(BASE).unwrap();
        let platform = registry.platform_package();
        assert_eq!(platform.name, PLATFORM_PACKAGE);
        assert!(platform.is_core_package);
    }

    #[test]
    fn platform_package_fallback_when_deleted() {
        let registry =
            PackageRegistry::parse_with_alter(BASE, r#"{"platform/core": null}"#).unwrap();
        assert!(!registry.contains(PLATFORM_PACKAGE));

        // Still resolvable through the built-in default.
        let platform = registry.platform_package();
        assert_eq!(platform.name, PLATFORM_PACKAGE);
        assert_eq!(platform.kind, PackageKind::Platform);
        assert!(platform.is_core_package);
        assert!(platform.enabled);
    }

    #[test]
    fn invalid_package_name_in_config() {
        let result = PackageRegistry::parse(r#"{"badname": {}}"#);
        assert!(matches!(result, Err(CoreError::InvalidPackageName { .. })));
    }

    #[test]
    fn load_with_alter_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("packages.json");
        let alter = dir.path().join("packages.local.json");
        std::fs::write(&base, BASE).unwrap();
        std::fs::write(&alter, r#"{"vendor/beta": null}"#).unwrap();

        let registry = PackageRegistry::load_with_alter(&base, Some(&alter)).unwrap();
        assert!(!registry.contains("vendor/beta"));

        let registry = PackageRegistry::load_with_alter(&base, None).unwrap();
        assert!(registry.contains("vendor/beta"));
    }
}
