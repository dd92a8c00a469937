//! Runner error types.

use testrig_core::CoreError;

/// Errors that can occur while building a fixture or running tests.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A fixture-build step failed. Fatal: the pipeline aborts rather
    /// than leaving a half-built fixture behind silently.
    #[error("fixture build failed at step '{step}': {detail}")]
    FixtureBuild { step: String, detail: String },

    /// Server lifecycle precondition violated (double start/stop).
    #[error("server '{server}': {detail}")]
    ServerState { server: String, detail: String },

    /// An external process could not be run or exited non-zero.
    #[error("process '{command}' failed: {detail}")]
    Process { command: String, detail: String },

    /// Fixture reset failed between package runs.
    #[error("fixture reset failed: {detail}")]
    Reset { detail: String },

    /// Composition error from the core crate.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;
