//! CLI command implementations.

pub mod compose;
pub mod packages;
pub mod resolve;
pub mod run;

use testrig_core::{CoreSpec, FixtureOptions, FixtureOptionsBuilder, ProjectTemplate};

use crate::FixtureArgs;

/// Translate command-line flags into the validated option set. Bad
/// flag combinations surface here, before anything external runs.
pub fn fixture_options(args: &FixtureArgs) -> anyhow::Result<FixtureOptions> {
    let mut builder = FixtureOptionsBuilder::new()
        .core(args.core.parse::<CoreSpec>()?)
        .bare(args.bare)
        .sut_only(args.sut_only)
        .dev(args.dev)
        .force(args.force)
        .prefer_source(args.prefer_source)
        .symlink_all(args.symlink_all)
        .ignore_patch_failure(args.ignore_patch_failure)
        .no_sqlite(args.no_sqlite)
        .no_site_install(args.no_site_install);
    if let Some(sut) = &args.sut {
        builder = builder.sut(sut);
    }
    if let Some(profile) = &args.profile {
        builder = builder.profile(profile);
    }
    if let Some(template) = &args.project_template {
        builder = builder.project_template(template.parse::<ProjectTemplate>()?);
    }
    Ok(builder.build()?)
}
