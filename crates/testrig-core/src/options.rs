//! Validated fixture options.
//!
//! Options are built through `FixtureOptionsBuilder`, which rejects
//! invalid combinations eagerly — before any external process could
//! run — and are immutable afterwards. The SUT package and the concrete
//! core version resolve lazily and are cached per options instance.

use std::cell::OnceCell;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::package::Package;
use crate::registry::PackageRegistry;
use crate::resolver::{VersionConstant, VersionResolver};
use crate::version::{self, Stability};

/// The core selector: a symbolic constant or a raw version/constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreSpec {
    /// One of the closed symbolic constants.
    Constant(VersionConstant),
    /// An exact version or arbitrary constraint string.
    Raw(String),
}

impl FromStr for CoreSpec {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        if let Ok(constant) = s.parse::<VersionConstant>() {
            return Ok(CoreSpec::Constant(constant));
        }
        if version::is_exact(s) || version::parse_requirement(s).is_ok() {
            return Ok(CoreSpec::Raw(s.to_string()));
        }
        Err(CoreError::InvalidArgument {
            option: "core".to_string(),
            value: s.to_string(),
            reason: "neither a symbolic constant nor valid constraint syntax".to_string(),
        })
    }
}

impl fmt::Display for CoreSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreSpec::Constant(c) => c.fmt(f),
            CoreSpec::Raw(s) => f.write_str(s),
        }
    }
}

/// Project template used for fixture creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectTemplate {
    /// Platform plus the bare minimum to install packages.
    Minimal,
    /// The full recommended project skeleton.
    Recommended,
}

impl ProjectTemplate {
    /// The spelling passed to the package manager.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectTemplate::Minimal => "minimal",
            ProjectTemplate::Recommended => "recommended",
        }
    }
}

impl FromStr for ProjectTemplate {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "minimal" => Ok(ProjectTemplate::Minimal),
            "recommended" => Ok(ProjectTemplate::Recommended),
            other => Err(CoreError::InvalidArgument {
                option: "project-template".to_string(),
                value: other.to_string(),
                reason: "expected 'minimal' or 'recommended'".to_string(),
            }),
        }
    }
}

impl fmt::Display for ProjectTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder for `FixtureOptions`. All flags default to off.
#[derive(Debug, Clone, Default)]
pub struct FixtureOptionsBuilder {
    core: Option<CoreSpec>,
    sut: Option<String>,
    bare: bool,
    sut_only: bool,
    dev: bool,
    force: bool,
    profile: Option<String>,
    project_template: Option<ProjectTemplate>,
    prefer_source: bool,
    symlink_all: bool,
    ignore_patch_failure: bool,
    no_sqlite: bool,
    no_site_install: bool,
}

impl FixtureOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn core(mut self, core: CoreSpec) -> Self {
        self.core = Some(core);
        self
    }

    pub fn sut(mut self, name: impl Into<String>) -> Self {
        self.sut = Some(name.into());
        self
    }

    pub fn bare(mut self, on: bool) -> Self {
        self.bare = on;
        self
    }

    pub fn sut_only(mut self, on: bool) -> Self {
        self.sut_only = on;
        self
    }

    pub fn dev(mut self, on: bool) -> Self {
        self.dev = on;
        self
    }

    pub fn force(mut self, on: bool) -> Self {
        self.force = on;
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn project_template(mut self, template: ProjectTemplate) -> Self {
        self.project_template = Some(template);
        self
    }

    pub fn prefer_source(mut self, on: bool) -> Self {
        self.prefer_source = on;
        self
    }

    pub fn symlink_all(mut self, on: bool) -> Self {
        self.symlink_all = on;
        self
    }

    pub fn ignore_patch_failure(mut self, on: bool) -> Self {
        self.ignore_patch_failure = on;
        self
    }

    pub fn no_sqlite(mut self, on: bool) -> Self {
        self.no_sqlite = on;
        self
    }

    pub fn no_site_install(mut self, on: bool) -> Self {
        self.no_site_install = on;
        self
    }

    /// Validate the combination and freeze the options.
    ///
    /// Raises before anything external runs: a violated invariant here
    /// must never leave a half-built fixture behind.
    pub fn build(self) -> Result<FixtureOptions> {
        if self.bare {
            if let Some(sut) = &self.sut {
                return Err(invalid("sut", sut, "cannot combine --sut with --bare"));
            }
            if self.symlink_all {
                return Err(invalid(
                    "symlink-all",
                    "true",
                    "cannot combine --symlink-all with --bare",
                ));
            }
        }
        if self.sut_only && self.sut.is_none() {
            return Err(invalid("sut-only", "true", "--sut-only requires --sut"));
        }

        Ok(FixtureOptions {
            core: self
                .core
                .unwrap_or(CoreSpec::Constant(VersionConstant::Current)),
            sut: self.sut,
            bare: self.bare,
            sut_only: self.sut_only,
            dev: self.dev,
            force: self.force,
            profile: self.profile,
            project_template: self.project_template,
            prefer_source: self.prefer_source,
            symlink_all: self.symlink_all,
            ignore_patch_failure: self.ignore_patch_failure,
            no_sqlite: self.no_sqlite,
            no_site_install: self.no_site_install,
            resolved_core: OnceCell::new(),
            resolved_sut: OnceCell::new(),
        })
    }
}

fn invalid(option: &str, value: &str, reason: &str) -> CoreError {
    CoreError::InvalidArgument {
        option: option.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// The validated, immutable option set for one fixture composition.
#[derive(Debug)]
pub struct FixtureOptions {
    core: CoreSpec,
    sut: Option<String>,
    bare: bool,
    sut_only: bool,
    dev: bool,
    force: bool,
    profile: Option<String>,
    project_template: Option<ProjectTemplate>,
    prefer_source: bool,
    symlink_all: bool,
    ignore_patch_failure: bool,
    no_sqlite: bool,
    no_site_install: bool,
    resolved_core: OnceCell<String>,
    resolved_sut: OnceCell<Package>,
}

impl FixtureOptions {
    pub fn core(&self) -> &CoreSpec {
        &self.core
    }

    pub fn sut(&self) -> Option<&str> {
        self.sut.as_deref()
    }

    pub fn bare(&self) -> bool {
        self.bare
    }

    pub fn sut_only(&self) -> bool {
        self.sut_only
    }

    pub fn dev(&self) -> bool {
        self.dev
    }

    pub fn force(&self) -> bool {
        self.force
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn prefer_source(&self) -> bool {
        self.prefer_source
    }

    pub fn symlink_all(&self) -> bool {
        self.symlink_all
    }

    pub fn ignore_patch_failure(&self) -> bool {
        self.ignore_patch_failure
    }

    pub fn no_sqlite(&self) -> bool {
        self.no_sqlite
    }

    pub fn no_site_install(&self) -> bool {
        self.no_site_install
    }

    /// The project template: the explicit override when given, minimal
    /// under sut-only composition, the recommended skeleton otherwise.
    pub fn project_template(&self) -> ProjectTemplate {
        match self.project_template {
            Some(template) => template,
            None if self.sut_only => ProjectTemplate::Minimal,
            None => ProjectTemplate::Recommended,
        }
    }

    /// The concrete core version, resolved once and cached.
    ///
    /// An exact raw version passes through verbatim; everything else
    /// goes through the resolver, at dev or stable minimum stability
    /// depending on the `dev` flag.
    pub fn core_resolved(&self, resolver: &VersionResolver<'_>) -> Result<String> {
        if let Some(v) = self.resolved_core.get() {
            return Ok(v.clone());
        }
        let resolved = match &self.core {
            CoreSpec::Constant(constant) => resolver.resolve(*constant)?,
            CoreSpec::Raw(raw) if version::is_exact(raw) => raw.clone(),
            CoreSpec::Raw(raw) => {
                let minimum = if self.dev { Stability::Dev } else { Stability::Stable };
                resolver.resolve_arbitrary(raw, minimum)?
            }
        };
        Ok(self.resolved_core.get_or_init(|| resolved).clone())
    }

    /// The SUT as a full package, resolved once and cached. `None` when
    /// no SUT was named; unknown names are fatal.
    pub fn sut_package(&self, registry: &PackageRegistry) -> Result<Option<Package>> {
        let Some(name) = &self.sut else {
            return Ok(None);
        };
        if let Some(pkg) = self.resolved_sut.get() {
            return Ok(Some(pkg.clone()));
        }
        let pkg = registry.get(name)?.clone();
        Ok(Some(self.resolved_sut.get_or_init(|| pkg).clone()))
    }
}
