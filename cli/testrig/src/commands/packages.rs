//! `testrig packages` — list the merged package registry.

use std::path::Path;

use crate::manifest::RigManifest;

pub fn run(project_dir: &Path, manifest: &RigManifest) -> anyhow::Result<i32> {
    let registry = manifest.load_registry(project_dir)?;
    for package in registry.iter() {
        let state = if package.enabled { "" } else { "  (disabled)" };
        println!(
            "{:<40} {:<10} {:<14} {}{}",
            package.name,
            package.kind.as_str(),
            package.default_version,
            package.default_version_dev,
            state
        );
    }
    Ok(0)
}
