//! Fixture composition core for the testrig tool.
//!
//! Decides which packages, at which versions, belong in a reproducible
//! multi-package test fixture for a given core platform version, and
//! validates that decision before anything external runs.
//!
//! # Architecture
//!
//! - **version / feed / resolver** — Symbolic version constants
//!   resolved to concrete versions through a best-candidate feed,
//!   memoized per resolver instance
//! - **package / registry** — Package definitions with ordered
//!   core-version matrices, loaded and alter-merged from JSON sources
//! - **options** — The validated, immutable fixture option set
//!
//! Everything with side effects (package manager, test frameworks,
//! servers) lives behind traits in the `testrig-runner` crate.

pub mod error;
pub mod feed;
pub mod options;
pub mod package;
pub mod registry;
pub mod resolver;
pub mod version;

// Re-exports for convenience.
pub use error::{CoreError, Result};
pub use feed::{FileFeed, ReleaseFeed};
pub use options::{CoreSpec, FixtureOptions, FixtureOptionsBuilder, ProjectTemplate};
pub use package::{Package, PackageConfig, PackageKind};
pub use registry::{PackageRegistry, PLATFORM_PACKAGE};
pub use resolver::{VersionConstant, VersionResolver};
pub use version::{Stability, Version, VersionReq};
