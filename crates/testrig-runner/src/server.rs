//! Background server lifecycle bracketing.
//!
//! Servers (web server, browser driver) start once before a batch and
//! stop once after it. Double start or double stop is a precondition
//! violation, not a race to guard against; there is exactly one actor.

use std::process::{Child, Command, Stdio};

use crate::error::{Result, RunnerError};

/// A background server with an explicit started/stopped state.
pub trait ServerControl {
    fn label(&self) -> &str;
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
}

/// Spawns a background child process on start and kills it on stop.
pub struct CommandServer {
    label: String,
    command: Vec<String>,
    child: Option<Child>,
}

impl CommandServer {
    /// `command` is the program followed by its arguments.
    pub fn new(label: impl Into<String>, command: Vec<String>) -> Self {
        CommandServer {
            label: label.into(),
            command,
            child: None,
        }
    }
}

impl ServerControl for CommandServer {
    fn label(&self) -> &str {
        &self.label
    }

    fn start(&mut self) -> Result<()> {
        if self.child.is_some() {
            return Err(RunnerError::ServerState {
                server: self.label.clone(),
                detail: "already started".to_string(),
            });
        }
        let (program, args) = self.command.split_first().ok_or_else(|| {
            RunnerError::ServerState {
                server: self.label.clone(),
                detail: "empty server command".to_string(),
            }
        })?;
        let child = Command::new(program)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| RunnerError::Process {
                command: program.clone(),
                detail: e.to_string(),
            })?;
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut child = self.child.take().ok_or_else(|| RunnerError::ServerState {
            server: self.label.clone(),
            detail: "not started".to_string(),
        })?;
        child.kill().map_err(|e| RunnerError::Process {
            command: self.label.clone(),
            detail: e.to_string(),
        })?;
        child.wait().map_err(|e| RunnerError::Process {
            command: self.label.clone(),
            detail: e.to_string(),
        })?;
        Ok(())
    }
}

impl Drop for CommandServer {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// An ordered set of servers bracketing one batch.
#[derive(Default)]
pub struct ServerSet {
    servers: Vec<Box<dyn ServerControl>>,
}

impl ServerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, server: Box<dyn ServerControl>) {
        self.servers.push(server);
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Start every server in registration order. On failure the
    /// already-started prefix is stopped, in reverse, before the error
    /// propagates.
    pub fn start_all(&mut self) -> Result<()> {
        for i in 0..self.servers.len() {
            if let Err(e) = self.servers[i].start() {
                for started in self.servers[..i].iter_mut().rev() {
                    let _ = started.stop();
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Stop every server in reverse registration order.
    pub fn stop_all(&mut self) -> Result<()> {
        for server in self.servers.iter_mut().rev() {
            server.stop()?;
        }
        Ok(())
    }
}
