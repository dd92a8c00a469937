//! Testrig CLI — compose multi-package test fixtures and run test
//! batches over them.

mod commands;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use manifest::RigManifest;

/// Exit code when the user declines a confirmation prompt.
const EXIT_USER_CANCEL: i32 = 75;

#[derive(Parser)]
#[command(
    name = "testrig",
    version,
    about = "Fixture composition and test orchestration"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Composition flags shared by `compose` and `run`.
#[derive(Args)]
struct FixtureArgs {
    /// System under test (vendor/name)
    #[arg(long)]
    sut: Option<String>,
    /// Core version: symbolic constant, exact version, or range
    #[arg(long, default_value = "current")]
    core: String,
    /// Compose the platform alone, without any packages
    #[arg(long)]
    bare: bool,
    /// Compose only the platform and the SUT
    #[arg(long)]
    sut_only: bool,
    /// Select dev versions and admit dev-stability cores
    #[arg(long)]
    dev: bool,
    /// Skip confirmation prompts
    #[arg(long)]
    force: bool,
    /// Package-manager profile
    #[arg(long)]
    profile: Option<String>,
    /// Project template (minimal, recommended)
    #[arg(long)]
    project_template: Option<String>,
    /// Prefer source installs
    #[arg(long)]
    prefer_source: bool,
    /// Symlink all path repositories
    #[arg(long)]
    symlink_all: bool,
    /// Continue when a patch fails to apply
    #[arg(long)]
    ignore_patch_failure: bool,
    /// Skip the bundled SQLite setup
    #[arg(long)]
    no_sqlite: bool,
    /// Skip the site install step
    #[arg(long)]
    no_site_install: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose a test fixture from the package registry
    Compose {
        #[command(flatten)]
        fixture: FixtureArgs,
        /// Print the composed package specs without building anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the test batch over an existing fixture
    Run {
        #[command(flatten)]
        fixture: FixtureArgs,
    },
    /// Resolve a symbolic version constant or constraint
    Resolve {
        /// Constant (e.g. current, next-minor-dev), exact version, or range
        spec: String,
        /// Admit dev-stability candidates for range constraints
        #[arg(long)]
        dev: bool,
    },
    /// List the merged package registry
    Packages,
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let cwd = std::env::current_dir()?;
    let (manifest, project_dir) = load_manifest_required(&cwd)?;

    match cli.command {
        Commands::Compose { fixture, dry_run } => {
            commands::compose::run(&project_dir, &manifest, &fixture, dry_run)
        }
        Commands::Run { fixture } => commands::run::run(&project_dir, &manifest, &fixture),
        Commands::Resolve { spec, dev } => {
            commands::resolve::run(&project_dir, &manifest, &spec, dev)
        }
        Commands::Packages => commands::packages::run(&project_dir, &manifest),
    }
}

/// Load the manifest, returning an error if not found.
fn load_manifest_required(cwd: &Path) -> anyhow::Result<(RigManifest, PathBuf)> {
    match RigManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => Ok((manifest, dir)),
        None => anyhow::bail!("no testrig.toml found (run from a project directory)"),
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn args() -> FixtureArgs {
        FixtureArgs {
            sut: None,
            core: "current".to_string(),
            bare: false,
            sut_only: false,
            dev: false,
            force: false,
            profile: None,
            project_template: None,
            prefer_source: false,
            symlink_all: false,
            ignore_patch_failure: false,
            no_sqlite: false,
            no_site_install: false,
        }
    }

    /// Write a minimal project (manifest, registry, releases) into a
    /// temp directory.
    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("testrig.toml"),
            r#"
[fixture]

[registry]
packages = "packages.json"
releases = "releases.json"

[package-manager]
program = "true"
"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("packages.json"),
            r#"{
                "platform/core": {"kind": "platform", "is_core_package": true},
                "vendor/a": {"version": "^1.0"},
                "vendor/b": {}
            }"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("releases.json"),
            r#"{
                "branches": "9.0,9.1",
                "releases": {"platform/core": ["9.0.0", "9.1.0", "9.1.1"]}
            }"#,
        )
        .unwrap();
        dir
    }

    fn load(dir: &tempfile::TempDir) -> RigManifest {
        let (manifest, found) = RigManifest::find_and_load(dir.path()).unwrap().unwrap();
        assert_eq!(found, dir.path());
        manifest
    }

    #[test]
    fn compose_dry_run_succeeds_without_building() {
        let dir = project();
        let manifest = load(&dir);

        let code = commands::compose::run(dir.path(), &manifest, &args(), true).unwrap();
        assert_eq!(code, 0);
        // Dry run never creates the fixture directory.
        assert!(!dir.path().join("fixture").exists());
    }

    #[test]
    fn compose_with_true_package_manager_builds() {
        let dir = project();
        let manifest = load(&dir);
        // `true` creates nothing, so stand in for create-project's
        // output; require/update run from inside this directory.
        std::fs::create_dir_all(dir.path().join("fixture")).unwrap();

        let mut composed = args();
        composed.force = true;
        let code = commands::compose::run(dir.path(), &manifest, &composed, false).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn run_without_fixture_is_an_error() {
        let dir = project();
        let manifest = load(&dir);

        let err = commands::run::run(dir.path(), &manifest, &args()).unwrap_err();
        assert!(err.to_string().contains("testrig compose"));
    }

    #[test]
    fn run_over_empty_fixture_passes() {
        let dir = project();
        let manifest = load(&dir);
        // Fixture exists but no package install paths do, so everything
        // is skipped and the batch passes.
        std::fs::create_dir_all(dir.path().join("fixture")).unwrap();

        let code = commands::run::run(dir.path(), &manifest, &args()).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn resolve_prints_constants_and_raw_specs() {
        let dir = project();
        let manifest = load(&dir);

        assert_eq!(
            commands::resolve::run(dir.path(), &manifest, "current", false).unwrap(),
            0
        );
        assert_eq!(
            commands::resolve::run(dir.path(), &manifest, "9.0.0", false).unwrap(),
            0
        );
        assert_eq!(
            commands::resolve::run(dir.path(), &manifest, "^9.0", false).unwrap(),
            0
        );
    }

    #[test]
    fn resolve_rejects_garbage() {
        let dir = project();
        let manifest = load(&dir);

        assert!(commands::resolve::run(dir.path(), &manifest, "no such thing", false).is_err());
    }

    #[test]
    fn packages_lists_merged_registry() {
        let dir = project();
        let manifest = load(&dir);

        assert_eq!(commands::packages::run(dir.path(), &manifest).unwrap(), 0);
    }

    #[test]
    fn conflicting_flags_are_rejected_before_any_work() {
        let dir = project();
        let manifest = load(&dir);

        let mut bad = args();
        bad.bare = true;
        bad.sut = Some("vendor/a".to_string());
        let err = commands::compose::run(dir.path(), &manifest, &bad, false).unwrap_err();
        assert!(err.to_string().contains("bare"));
        assert!(!dir.path().join("fixture").exists());
    }
}
