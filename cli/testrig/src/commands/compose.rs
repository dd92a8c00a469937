//! `testrig compose` — build a fixture from the composed package set.

use std::io::{BufRead, Write};
use std::path::Path;

use testrig_core::VersionResolver;
use testrig_runner::{composition_args, composition_specs, CommandPackageManager, FixtureBuilder};

use crate::manifest::RigManifest;
use crate::{FixtureArgs, EXIT_USER_CANCEL};

pub fn run(
    project_dir: &Path,
    manifest: &RigManifest,
    args: &FixtureArgs,
    dry_run: bool,
) -> anyhow::Result<i32> {
    let options = super::fixture_options(args)?;
    let registry = manifest.load_registry(project_dir)?;
    let feed = manifest.load_feed(project_dir)?;
    let resolver = VersionResolver::new(&feed, manifest.platform());

    let specs = composition_specs(&registry, &options, &resolver)?;
    if dry_run {
        for spec in &specs {
            println!("{spec}");
        }
        return Ok(0);
    }

    let target = manifest.fixture_dir(project_dir);
    if target.exists() && !options.force() {
        let question = format!("fixture at {} already exists, rebuild it?", target.display());
        if !confirm(&question)? {
            eprintln!("cancelled");
            return Ok(EXIT_USER_CANCEL);
        }
    }

    let mut manager = CommandPackageManager::new(&manifest.package_manager.program)
        .with_extra_args(composition_args(&options))
        .with_working_dir(target.clone());
    FixtureBuilder::new(&registry, &options, &resolver, &mut manager).build(&target)?;

    println!("composed {} package(s) at {}", specs.len(), target.display());
    Ok(0)
}

/// Ask a yes/no question; default is no.
fn confirm(question: &str) -> anyhow::Result<bool> {
    eprint!("{question} [y/N] ");
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
