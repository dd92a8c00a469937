//! `testrig resolve` — print the concrete version for a symbolic spec.

use std::path::Path;

use testrig_core::{version, CoreSpec, Stability, VersionResolver};

use crate::manifest::RigManifest;

pub fn run(project_dir: &Path, manifest: &RigManifest, spec: &str, dev: bool) -> anyhow::Result<i32> {
    let feed = manifest.load_feed(project_dir)?;
    let resolver = VersionResolver::new(&feed, manifest.platform());

    let resolved = match spec.parse::<CoreSpec>()? {
        CoreSpec::Constant(constant) => resolver.resolve(constant)?,
        // Exact versions pass through without touching the feed.
        CoreSpec::Raw(raw) if version::is_exact(&raw) => raw,
        CoreSpec::Raw(raw) => {
            let minimum = if dev { Stability::Dev } else { Stability::Stable };
            resolver.resolve_arbitrary(&raw, minimum)?
        }
    };
    println!("{resolved}");
    Ok(0)
}
