//! External process interfaces: the package manager and test
//! frameworks.
//!
//! Both collaborators run synchronously and report success through
//! their exit status. The traits keep the orchestration logic testable
//! without spawning anything.

use std::path::{Path, PathBuf};
use std::process::Command;

use testrig_core::Package;

use crate::error::{Result, RunnerError};
use crate::orchestrate::{Framework, TestOutcome, TestScope};

/// The external package manager, invoked with fully materialized
/// argument lists.
pub trait PackageManager {
    /// Create a fresh project from the named template at `target`.
    fn create_project(&mut self, template: &str, target: &Path) -> Result<()>;

    /// Require the given `name:version` package specs.
    fn require(&mut self, specs: &[String]) -> Result<()>;

    /// Remove the given packages.
    fn remove(&mut self, names: &[String]) -> Result<()>;

    /// Update the lock file.
    fn update_lock(&mut self) -> Result<()>;
}

/// Runs one test framework against one package.
pub trait FrameworkRunner {
    fn run(
        &mut self,
        package: &Package,
        framework: &Framework,
        scope: TestScope,
        coverage: bool,
    ) -> Result<TestOutcome>;
}

/// `std::process::Command`-backed package manager.
pub struct CommandPackageManager {
    program: String,
    /// Composition flags appended to every invocation.
    extra_args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl CommandPackageManager {
    pub fn new(program: impl Into<String>) -> Self {
        CommandPackageManager {
            program: program.into(),
            extra_args: Vec::new(),
            working_dir: None,
        }
    }

    /// Append composition flags (see `compose::composition_args`).
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Run the post-creation steps (`require`, `remove`, `update`)
    /// from this directory. `create-project` always runs from the
    /// invoking directory, since the target does not exist yet.
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    fn run(&self, args: &[String], cwd: Option<&Path>) -> Result<()> {
        let mut command = Command::new(&self.program);
        command.args(args).args(&self.extra_args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }
        let status = command.status().map_err(|e| RunnerError::Process {
            command: self.program.clone(),
            detail: e.to_string(),
        })?;
        if !status.success() {
            return Err(RunnerError::Process {
                command: format!("{} {}", self.program, args.join(" ")),
                detail: format!("exited with {status}"),
            });
        }
        Ok(())
    }
}

impl PackageManager for CommandPackageManager {
    fn create_project(&mut self, template: &str, target: &Path) -> Result<()> {
        self.run(
            &[
                "create-project".to_string(),
                template.to_string(),
                target.display().to_string(),
            ],
            None,
        )
    }

    fn require(&mut self, specs: &[String]) -> Result<()> {
        let mut args = vec!["require".to_string()];
        args.extend_from_slice(specs);
        self.run(&args, self.working_dir.as_deref())
    }

    fn remove(&mut self, names: &[String]) -> Result<()> {
        let mut args = vec!["remove".to_string()];
        args.extend_from_slice(names);
        self.run(&args, self.working_dir.as_deref())
    }

    fn update_lock(&mut self) -> Result<()> {
        self.run(
            &["update".to_string(), "--lock".to_string()],
            self.working_dir.as_deref(),
        )
    }
}

/// `std::process::Command`-backed framework runner. Each framework runs
/// from the package's install directory under the fixture root.
pub struct CommandFrameworkRunner {
    fixture_root: PathBuf,
}

impl CommandFrameworkRunner {
    pub fn new(fixture_root: PathBuf) -> Self {
        CommandFrameworkRunner { fixture_root }
    }
}

impl FrameworkRunner for CommandFrameworkRunner {
    fn run(
        &mut self,
        package: &Package,
        framework: &Framework,
        scope: TestScope,
        coverage: bool,
    ) -> Result<TestOutcome> {
        let mut command = Command::new(&framework.command);
        command
            .args(&framework.args)
            .current_dir(self.fixture_root.join(package.install_path()));
        if scope == TestScope::Public {
            command.args(&framework.public_args);
        }
        if coverage {
            command.args(&framework.coverage_args);
        }

        let status = command.status().map_err(|e| RunnerError::Process {
            command: framework.command.clone(),
            detail: e.to_string(),
        })?;
        Ok(if status.success() {
            TestOutcome::Passed
        } else {
            TestOutcome::Failed
        })
    }
}
