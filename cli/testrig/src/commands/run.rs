//! `testrig run` — orchestrate the test batch over an existing fixture.

use std::path::Path;

use testrig_runner::{CommandFrameworkRunner, DirFixtureHost, TestOrchestrator};

use crate::manifest::RigManifest;
use crate::FixtureArgs;

pub fn run(project_dir: &Path, manifest: &RigManifest, args: &FixtureArgs) -> anyhow::Result<i32> {
    let options = super::fixture_options(args)?;
    let registry = manifest.load_registry(project_dir)?;

    let fixture = manifest.fixture_dir(project_dir);
    if !fixture.is_dir() {
        anyhow::bail!(
            "no fixture at {} (run `testrig compose` first)",
            fixture.display()
        );
    }

    let mut host = DirFixtureHost::new(fixture.clone());
    if let Some(reset) = manifest.fixture.reset.clone() {
        host = host.with_reset_command(reset);
    }
    let mut runner = CommandFrameworkRunner::new(fixture);
    let mut servers = manifest.server_set();

    let mut orchestrator = TestOrchestrator::new(
        &registry,
        &options,
        &manifest.frameworks,
        &mut host,
        &mut runner,
    );
    if !servers.is_empty() {
        orchestrator = orchestrator.with_servers(&mut servers);
    }
    let result = orchestrator.run()?;

    for name in &result.skipped {
        println!("skipped: {name}");
    }
    if result.success() {
        println!("all test runs passed");
        Ok(0)
    } else {
        for failure in &result.failures {
            println!("failed: {failure}");
        }
        Ok(1)
    }
}
