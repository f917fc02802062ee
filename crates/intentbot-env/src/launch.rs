//! Application launcher: start the app detached and hand back an owned handle.
//!
//! The child gets its own process group (Unix) or console (Windows), so it is
//! not tied to the launching terminal. Dropping [`AppProcess`] does not kill
//! the child; call [`AppProcess::stop`] for that.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Instant;

use crate::error::BootstrapError;

/// What to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchTarget {
    /// `<environment python> <entry_point>`
    Script { entry_point: PathBuf },
    /// Any program, e.g. this binary's own `serve` subcommand
    Command { program: PathBuf, args: Vec<String> },
}

impl LaunchTarget {
    /// Program and arguments, using `python` for `Script` targets.
    pub fn resolve(&self, python: &Path) -> (PathBuf, Vec<String>) {
        match self {
            LaunchTarget::Script { entry_point } => (
                python.to_path_buf(),
                vec![entry_point.to_string_lossy().to_string()],
            ),
            LaunchTarget::Command { program, args } => (program.clone(), args.clone()),
        }
    }

    pub fn needs_python(&self) -> bool {
        matches!(self, LaunchTarget::Script { .. })
    }
}

/// Owned handle to a launched application.
#[derive(Debug)]
pub struct AppProcess {
    child: Child,
    command: String,
    started_at: Instant,
}

impl AppProcess {
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Exit status if the child has already exited.
    pub fn exit_status(&mut self) -> Option<ExitStatus> {
        self.child.try_wait().ok().flatten()
    }

    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Kill the child (if still running) and reap it.
    pub fn stop(&mut self) -> std::io::Result<()> {
        if self.is_running() {
            tracing::info!(pid = self.id(), command = %self.command, "Stopping application");
            self.child.kill()?;
        }
        self.child.wait()?;
        Ok(())
    }

    /// Block until the child exits.
    pub fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait()
    }
}

/// Spawn `program args...` detached from the current session.
pub fn launch(program: &Path, args: &[String], cwd: Option<&Path>) -> Result<AppProcess, BootstrapError> {
    let command = std::iter::once(program.to_string_lossy().to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ");

    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    detach(&mut cmd);

    let child = cmd.spawn().map_err(|e| BootstrapError::Launch {
        command: command.clone(),
        reason: e.to_string(),
    })?;
    tracing::info!(pid = child.id(), command = %command, "Launched application");
    Ok(AppProcess {
        child,
        command,
        started_at: Instant::now(),
    })
}

#[cfg(unix)]
fn detach(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    // Own process group: Ctrl+C in the launching terminal does not reach the app.
    cmd.process_group(0);
}

#[cfg(windows)]
fn detach(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;
    cmd.creation_flags(CREATE_NEW_CONSOLE);
}

#[cfg(not(any(unix, windows)))]
fn detach(_cmd: &mut Command) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_target_uses_env_python() {
        let target = LaunchTarget::Script {
            entry_point: PathBuf::from("app.py"),
        };
        let (program, args) = target.resolve(Path::new("venv/bin/python"));
        assert_eq!(program, PathBuf::from("venv/bin/python"));
        assert_eq!(args, vec!["app.py"]);
        assert!(target.needs_python());
    }

    #[test]
    fn test_command_target_ignores_python() {
        let target = LaunchTarget::Command {
            program: PathBuf::from("/usr/local/bin/intentbot"),
            args: vec!["serve".to_string()],
        };
        let (program, args) = target.resolve(Path::new("python"));
        assert_eq!(program, PathBuf::from("/usr/local/bin/intentbot"));
        assert_eq!(args, vec!["serve"]);
        assert!(!target.needs_python());
    }

    #[test]
    fn test_launch_missing_program_fails() {
        let err = launch(Path::new("intentbot-no-such-program"), &[], None).unwrap_err();
        assert!(matches!(err, BootstrapError::Launch { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_launch_then_stop() {
        let mut app = launch(Path::new("sleep"), &["30".to_string()], None).unwrap();
        assert!(app.is_running());
        assert!(app.id() > 0);
        app.stop().unwrap();
        assert!(!app.is_running());
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_after_quick_exit() {
        let mut app = launch(Path::new("true"), &[], None).unwrap();
        let status = app.wait().unwrap();
        assert!(status.success());
        assert!(app.exit_status().is_some());
    }
}
