//! Test orchestration across every package in a composed fixture.
//!
//! One strictly sequential state machine per run: optional servers up,
//! SUT full suite, every other package public-only, servers down,
//! aggregate. A single package's failure is recorded and never aborts
//! the rest of the batch; the final signal is the AND over every
//! `(package, framework)` outcome.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use testrig_core::{FixtureOptions, Package, PackageRegistry};

use crate::error::{Result, RunnerError};
use crate::process::FrameworkRunner;
use crate::server::ServerSet;

/// Which test groups a framework run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestScope {
    /// Public test groups only (every non-SUT package).
    Public,
    /// The full public plus private suite (the SUT).
    All,
}

/// Outcome of one `(package, framework)` task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed,
}

/// One configured test framework, applied to every package in a run.
#[derive(Debug, Clone, Deserialize)]
pub struct Framework {
    /// Human-readable label used in failure records.
    pub label: String,
    /// Program to invoke.
    pub command: String,
    /// Base arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra arguments selecting the public test groups.
    #[serde(default)]
    pub public_args: Vec<String>,
    /// Extra arguments enabling coverage generation.
    #[serde(default)]
    pub coverage_args: Vec<String>,
}

/// Fixture-side collaborator: baseline reset and install locations.
pub trait FixtureHost {
    /// Restore the fixture to its baseline state. Runs before each
    /// package so no run sees another's side effects.
    fn reset(&mut self) -> Result<()>;

    /// Root directory packages are installed under.
    fn install_root(&self) -> &Path;
}

/// Filesystem fixture host, optionally running a reset command in the
/// fixture root.
pub struct DirFixtureHost {
    root: PathBuf,
    reset_command: Option<Vec<String>>,
}

impl DirFixtureHost {
    pub fn new(root: PathBuf) -> Self {
        DirFixtureHost {
            root,
            reset_command: None,
        }
    }

    /// Use the given command line (program plus arguments) for resets.
    pub fn with_reset_command(mut self, command: Vec<String>) -> Self {
        self.reset_command = Some(command);
        self
    }
}

impl FixtureHost for DirFixtureHost {
    fn reset(&mut self) -> Result<()> {
        let Some(command) = &self.reset_command else {
            return Ok(());
        };
        let (program, args) = command.split_first().ok_or_else(|| RunnerError::Reset {
            detail: "empty reset command".to_string(),
        })?;
        let status = std::process::Command::new(program)
            .args(args)
            .current_dir(&self.root)
            .status()
            .map_err(|e| RunnerError::Reset {
                detail: format!("{program}: {e}"),
            })?;
        if !status.success() {
            return Err(RunnerError::Reset {
                detail: format!("{program} exited with {status}"),
            });
        }
        Ok(())
    }

    fn install_root(&self) -> &Path {
        &self.root
    }
}

/// The aggregated result of one orchestration run.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Failure records, formatted `<package>: <framework label>`.
    pub failures: Vec<String>,
    /// Packages skipped because their install path was absent.
    pub skipped: Vec<String>,
}

impl BatchResult {
    /// Success iff no `(package, framework)` task failed.
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives test frameworks across the SUT and every other fixture
/// package, isolating failures between packages.
pub struct TestOrchestrator<'a> {
    registry: &'a PackageRegistry,
    options: &'a FixtureOptions,
    frameworks: &'a [Framework],
    host: &'a mut dyn FixtureHost,
    runner: &'a mut dyn FrameworkRunner,
    servers: Option<&'a mut ServerSet>,
}

impl<'a> TestOrchestrator<'a> {
    pub fn new(
        registry: &'a PackageRegistry,
        options: &'a FixtureOptions,
        frameworks: &'a [Framework],
        host: &'a mut dyn FixtureHost,
        runner: &'a mut dyn FrameworkRunner,
    ) -> Self {
        TestOrchestrator {
            registry,
            options,
            frameworks,
            host,
            runner,
            servers: None,
        }
    }

    /// Bracket the batch with background servers.
    pub fn with_servers(mut self, servers: &'a mut ServerSet) -> Self {
        self.servers = Some(servers);
        self
    }

    /// Run the whole batch and aggregate the result.
    pub fn run(&mut self) -> Result<BatchResult> {
        let sut = self.options.sut_package(self.registry)?;
        let mut result = BatchResult::default();

        if let Some(servers) = self.servers.as_deref_mut() {
            servers.start_all()?;
        }

        let batch = self.run_packages(&sut, &mut result);

        // Servers come down whether or not the batch errored.
        let stopped = match self.servers.as_deref_mut() {
            Some(servers) => servers.stop_all(),
            None => Ok(()),
        };
        batch?;
        stopped?;

        Ok(result)
    }

    fn run_packages(&mut self, sut: &Option<Package>, result: &mut BatchResult) -> Result<()> {
        // The SUT always runs its full public+private suite; coverage
        // is requested only under sut-only composition.
        if let Some(sut) = sut {
            self.run_one(sut, TestScope::All, self.options.sut_only(), result)?;
        }

        if self.options.sut_only() {
            return Ok(());
        }

        for package in self.registry.iter() {
            if !package.enabled || package.is_core_package {
                continue;
            }
            if let Some(sut) = sut {
                if sut.name == package.name {
                    continue;
                }
            }
            let installed = self.host.install_root().join(package.install_path());
            if !installed.exists() {
                eprintln!(
                    "warning: skipping {}: not installed at {}",
                    package.name,
                    installed.display()
                );
                result.skipped.push(package.name.clone());
                continue;
            }
            self.run_one(package, TestScope::Public, false, result)?;
        }

        Ok(())
    }

    /// Run every framework against one package. A task failure is
    /// recorded and the batch continues; a reset failure is fatal.
    fn run_one(
        &mut self,
        package: &Package,
        scope: TestScope,
        coverage: bool,
        result: &mut BatchResult,
    ) -> Result<()> {
        self.host.reset()?;
        for framework in self.frameworks {
            let outcome = self.runner.run(package, framework, scope, coverage);
            match outcome {
                Ok(TestOutcome::Passed) => {}
                Ok(TestOutcome::Failed) | Err(_) => {
                    result
                        .failures
                        .push(format!("{}: {}", package.name, framework.label));
                }
            }
        }
        Ok(())
    }
}
