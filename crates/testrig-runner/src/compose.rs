//! Fixture composition: materializing package specs and driving the
//! package manager through the build steps.
//!
//! Spec selection is where the core matrix pays off: every included
//! package is pinned at the version its matrix picks for the resolved
//! core. The build itself is a fatal stepwise pipeline; a failed step
//! aborts before the next one runs.

use std::path::Path;

use testrig_core::{FixtureOptions, Package, PackageRegistry, VersionResolver};

use crate::error::{Result, RunnerError};
use crate::process::PackageManager;

/// The `name:version` requirement spec for one package at the given
/// core version, or `None` for packages that never enter composition
/// (disabled ones, and the platform package which is pinned separately).
pub fn package_spec(package: &Package, core: &str, dev: bool) -> Result<Option<String>> {
    if !package.enabled || package.is_core_package {
        return Ok(None);
    }
    let version = if dev {
        package.dev_version(Some(core))?
    } else {
        package.recommended_version(Some(core))?
    };
    Ok(Some(format!("{}:{}", package.name, version)))
}

/// All requirement specs for one composition, platform first.
///
/// - bare: the platform alone
/// - sut-only: platform plus the SUT
/// - default: platform plus every enabled package, in name order
pub fn composition_specs(
    registry: &PackageRegistry,
    options: &FixtureOptions,
    resolver: &VersionResolver<'_>,
) -> Result<Vec<String>> {
    let core = options.core_resolved(resolver)?;
    let platform = registry.platform_package();
    let mut specs = vec![format!("{}:{}", platform.name, core)];

    if options.bare() {
        return Ok(specs);
    }

    if options.sut_only() {
        if let Some(sut) = options.sut_package(registry)? {
            if let Some(spec) = package_spec(&sut, &core, options.dev())? {
                specs.push(spec);
            }
        }
        return Ok(specs);
    }

    for package in registry.iter() {
        if let Some(spec) = package_spec(package, &core, options.dev())? {
            specs.push(spec);
        }
    }
    Ok(specs)
}

/// Package-manager flags materialized from the composition options.
pub fn composition_args(options: &FixtureOptions) -> Vec<String> {
    let mut args = Vec::new();
    if options.prefer_source() {
        args.push("--prefer-source".to_string());
    }
    if options.symlink_all() {
        args.push("--symlink-all".to_string());
    }
    if options.ignore_patch_failure() {
        args.push("--ignore-patch-failure".to_string());
    }
    if options.no_sqlite() {
        args.push("--no-sqlite".to_string());
    }
    if options.no_site_install() {
        args.push("--no-site-install".to_string());
    }
    if let Some(profile) = options.profile() {
        args.push(format!("--profile={profile}"));
    }
    args
}

/// Drives the package manager through the fixture-build steps.
pub struct FixtureBuilder<'a> {
    registry: &'a PackageRegistry,
    options: &'a FixtureOptions,
    resolver: &'a VersionResolver<'a>,
    manager: &'a mut dyn PackageManager,
}

impl<'a> FixtureBuilder<'a> {
    pub fn new(
        registry: &'a PackageRegistry,
        options: &'a FixtureOptions,
        resolver: &'a VersionResolver<'a>,
        manager: &'a mut dyn PackageManager,
    ) -> Self {
        FixtureBuilder {
            registry,
            options,
            resolver,
            manager,
        }
    }

    /// Build the fixture at `target`: create-project, require the
    /// composed specs, update the lock. Each step is fatal on failure.
    pub fn build(&mut self, target: &Path) -> Result<()> {
        // Resolve everything up front so a bad option or an
        // unresolvable version aborts before any destructive step.
        let specs = composition_specs(self.registry, self.options, self.resolver)?;
        let template = self.options.project_template();

        self.step("create-project", |b| {
            b.manager.create_project(template.as_str(), target)
        })?;
        self.step("require", |b| b.manager.require(&specs))?;
        self.step("update-lock", |b| b.manager.update_lock())?;
        Ok(())
    }

    fn step(&mut self, name: &str, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        f(self).map_err(|e| RunnerError::FixtureBuild {
            step: name.to_string(),
            detail: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use testrig_core::{CoreSpec, FileFeed, FixtureOptionsBuilder};

    fn registry() -> PackageRegistry {
        PackageRegistry::parse(
            r#"{
                "platform/core": {"kind": "platform", "is_core_package": true},
                "vendor/a": {
                    "version": "^1.0",
                    "version_dev": "1.x-dev",
                    "core_matrix": [{"core": "9.1.*", "version": "^3.0", "version_dev": "3.x-dev"}]
                },
                "vendor/b": {"version": "^2.0"},
                "vendor/off": {"enabled": false}
            }"#,
        )
        .unwrap()
    }

    fn feed() -> FileFeed {
        FileFeed::parse(
            r#"{
                "branches": "9.1",
                "releases": {"platform/core": ["9.0.0", "9.1.0"]}
            }"#,
        )
        .unwrap()
    }

    fn options(core: &str) -> FixtureOptions {
        FixtureOptionsBuilder::new()
            .core(core.parse::<CoreSpec>().unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn default_composition_includes_enabled_packages() {
        let feed = feed();
        let resolver = VersionResolver::new(&feed, "platform/core");
        let specs = composition_specs(&registry(), &options("current"), &resolver).unwrap();

        assert_eq!(
            specs,
            vec![
                "platform/core:9.1.0".to_string(),
                "vendor/a:^3.0".to_string(),
                "vendor/b:^2.0".to_string(),
            ]
        );
    }

    #[test]
    fn bare_composition_is_platform_only() {
        let feed = feed();
        let resolver = VersionResolver::new(&feed, "platform/core");
        let opts = FixtureOptionsBuilder::new()
            .core("current".parse().unwrap())
            .bare(true)
            .build()
            .unwrap();
        let specs = composition_specs(&registry(), &opts, &resolver).unwrap();
        assert_eq!(specs, vec!["platform/core:9.1.0".to_string()]);
    }

    #[test]
    fn sut_only_composition_is_platform_plus_sut() {
        let feed = feed();
        let resolver = VersionResolver::new(&feed, "platform/core");
        let opts = FixtureOptionsBuilder::new()
            .core("current".parse().unwrap())
            .sut("vendor/b")
            .sut_only(true)
            .build()
            .unwrap();
        let specs = composition_specs(&registry(), &opts, &resolver).unwrap();
        assert_eq!(
            specs,
            vec!["platform/core:9.1.0".to_string(), "vendor/b:^2.0".to_string()]
        );
    }

    #[test]
    fn dev_flag_selects_dev_versions() {
        let feed = feed();
        let resolver = VersionResolver::new(&feed, "platform/core");
        let opts = FixtureOptionsBuilder::new()
            .core(CoreSpec::Raw("9.1.0".to_string()))
            .dev(true)
            .build()
            .unwrap();
        let specs = composition_specs(&registry(), &opts, &resolver).unwrap();
        assert_eq!(
            specs,
            vec![
                "platform/core:9.1.0".to_string(),
                "vendor/a:3.x-dev".to_string(),
                "vendor/b:*@dev".to_string(),
            ]
        );
    }

    #[test]
    fn matrix_pins_by_resolved_core() {
        let pkg = registry().get("vendor/a").unwrap().clone();
        // Core outside the matrix row: static default.
        assert_eq!(
            package_spec(&pkg, "9.0.0", false).unwrap().unwrap(),
            "vendor/a:^1.0"
        );
        // Core inside: the matrix version.
        assert_eq!(
            package_spec(&pkg, "9.1.4", false).unwrap().unwrap(),
            "vendor/a:^3.0"
        );
    }

    #[test]
    fn disabled_and_platform_yield_no_spec() {
        let registry = registry();
        assert_eq!(
            package_spec(registry.get("vendor/off").unwrap(), "9.1.0", false).unwrap(),
            None
        );
        assert_eq!(
            package_spec(&registry.platform_package(), "9.1.0", false).unwrap(),
            None
        );
    }

    #[test]
    fn composition_args_materialize_flags() {
        let opts = FixtureOptionsBuilder::new()
            .prefer_source(true)
            .no_sqlite(true)
            .profile("ci")
            .build()
            .unwrap();
        assert_eq!(
            composition_args(&opts),
            vec![
                "--prefer-source".to_string(),
                "--no-sqlite".to_string(),
                "--profile=ci".to_string(),
            ]
        );

        let none = FixtureOptionsBuilder::new().build().unwrap();
        assert!(composition_args(&none).is_empty());
    }

    /// Records calls; fails the step named in `fail_at`.
    struct RecordingManager {
        calls: Vec<String>,
        fail_at: Option<&'static str>,
    }

    impl RecordingManager {
        fn new(fail_at: Option<&'static str>) -> Self {
            RecordingManager {
                calls: vec![],
                fail_at,
            }
        }

        fn check(&mut self, step: &'static str) -> Result<()> {
            self.calls.push(step.to_string());
            if self.fail_at == Some(step) {
                return Err(RunnerError::Process {
                    command: step.to_string(),
                    detail: "scripted failure".to_string(),
                });
            }
            Ok(())
        }
    }

    impl PackageManager for RecordingManager {
        fn create_project(&mut self, template: &str, _target: &Path) -> Result<()> {
            self.calls.push(format!("template={template}"));
            self.check("create-project")
        }
        fn require(&mut self, specs: &[String]) -> Result<()> {
            self.calls.push(format!("require={}", specs.join(",")));
            self.check("require")
        }
        fn remove(&mut self, _names: &[String]) -> Result<()> {
            self.check("remove")
        }
        fn update_lock(&mut self) -> Result<()> {
            self.check("update-lock")
        }
    }

    #[test]
    fn build_runs_steps_in_order() {
        let feed = feed();
        let resolver = VersionResolver::new(&feed, "platform/core");
        let registry = registry();
        let opts = options("current");
        let mut manager = RecordingManager::new(None);

        FixtureBuilder::new(&registry, &opts, &resolver, &mut manager)
            .build(&PathBuf::from("fixture"))
            .unwrap();

        assert_eq!(manager.calls[0], "template=recommended");
        assert_eq!(manager.calls[1], "create-project");
        assert!(manager.calls[2].starts_with("require=platform/core:9.1.0"));
        assert_eq!(manager.calls[4], "update-lock");
    }

    #[test]
    fn failed_step_aborts_pipeline() {
        let feed = feed();
        let resolver = VersionResolver::new(&feed, "platform/core");
        let registry = registry();
        let opts = options("current");
        let mut manager = RecordingManager::new(Some("require"));

        let err = FixtureBuilder::new(&registry, &opts, &resolver, &mut manager)
            .build(&PathBuf::from("fixture"))
            .unwrap_err();

        assert!(matches!(err, RunnerError::FixtureBuild { ref step, .. } if step == "require"));
        // update-lock never ran.
        assert!(!manager.calls.contains(&"update-lock".to_string()));
    }

    #[test]
    fn invalid_core_aborts_before_any_step() {
        let feed = FileFeed::parse(r#"{"branches": "", "releases": {}}"#).unwrap();
        let resolver = VersionResolver::new(&feed, "platform/core");
        let registry = registry();
        let opts = options("current");
        let mut manager = RecordingManager::new(None);

        let err = FixtureBuilder::new(&registry, &opts, &resolver, &mut manager)
            .build(&PathBuf::from("fixture"))
            .unwrap_err();

        assert!(matches!(
            err,
            RunnerError::Core(testrig_core::CoreError::CurrentUnresolvable)
        ));
        assert!(manager.calls.is_empty());
    }
}
