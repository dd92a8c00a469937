//! Fixture building and batch test orchestration.
//!
//! This crate turns a composed package set into a runnable fixture and
//! drives test frameworks across it:
//!
//! - [`compose`]: requirement-spec materialization and the stepwise
//!   fixture build pipeline
//! - [`orchestrate`]: the sequential batch runner with failure
//!   isolation
//! - [`process`]: the package-manager and framework-runner seams and
//!   their `std::process::Command` implementations
//! - [`server`]: background server lifecycle bracketing a batch

pub mod compose;
pub mod error;
pub mod orchestrate;
pub mod process;
pub mod server;

pub use compose::{composition_args, composition_specs, package_spec, FixtureBuilder};
pub use error::{Result, RunnerError};
pub use orchestrate::{
    BatchResult, DirFixtureHost, FixtureHost, Framework, TestOrchestrator, TestOutcome, TestScope,
};
pub use process::{
    CommandFrameworkRunner, CommandPackageManager, FrameworkRunner, PackageManager,
};
pub use server::{CommandServer, ServerControl, ServerSet};
