//! Command execution seam for the provisioning steps.
//!
//! Provisioner and installer only build [`CommandSpec`]s; a [`CommandRunner`]
//! executes them. [`SystemRunner`] spawns real processes.

use std::path::PathBuf;
use std::process::{Command, Stdio};

/// A command to run to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Capture stdout/stderr instead of passing them through to the console
    pub capture: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            capture: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Shell-like rendering for logs and error messages.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.to_string_lossy().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Result of a finished command. `stdout`/`stderr` are empty unless captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl StepOutput {
    /// Human-readable failure reason: exit code plus the stderr tail.
    pub fn failure_reason(&self) -> String {
        let code = self
            .code
            .map(|c| format!("exit code {}", c))
            .unwrap_or_else(|| "terminated by signal".to_string());
        let tail: Vec<&str> = self.stderr.lines().rev().take(5).collect();
        if tail.is_empty() {
            code
        } else {
            let tail: Vec<&str> = tail.into_iter().rev().collect();
            format!("{}: {}", code, tail.join(" | "))
        }
    }
}

pub trait CommandRunner {
    /// Run to completion. `Err` only when the process could not be spawned.
    fn run(&self, spec: &CommandSpec) -> std::io::Result<StepOutput>;
}

/// Runs commands with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> std::io::Result<StepOutput> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).stdin(Stdio::null());
        if let Some(ref cwd) = spec.cwd {
            cmd.current_dir(cwd);
        }
        tracing::debug!(command = %spec.display(), "Running");

        if spec.capture {
            let out = cmd.output()?;
            Ok(StepOutput {
                success: out.status.success(),
                code: out.status.code(),
                stdout: String::from_utf8_lossy(&out.stdout).to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).to_string(),
            })
        } else {
            let status = cmd.status()?;
            Ok(StepOutput {
                success: status.success(),
                code: status.code(),
                ..Default::default()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_display() {
        let spec = CommandSpec::new("python3").args(["-m", "venv", "venv"]);
        assert_eq!(spec.display(), "python3 -m venv venv");
        assert!(!spec.capture);
        assert!(spec.captured().capture);
    }

    #[test]
    fn test_failure_reason_uses_stderr_tail() {
        let out = StepOutput {
            success: false,
            code: Some(1),
            stdout: String::new(),
            stderr: "a\nb\nERROR: No matching distribution\n".to_string(),
        };
        assert_eq!(
            out.failure_reason(),
            "exit code 1: a | b | ERROR: No matching distribution"
        );
        let out = StepOutput {
            success: false,
            code: None,
            ..Default::default()
        };
        assert_eq!(out.failure_reason(), "terminated by signal");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_output() {
        let spec = CommandSpec::new("sh").args(["-c", "echo out; echo err 1>&2; exit 3"]).captured();
        let out = SystemRunner.run(&spec).unwrap();
        assert!(!out.success);
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
    }

    #[test]
    fn test_system_runner_missing_program() {
        let spec = CommandSpec::new("intentbot-definitely-missing-binary").captured();
        assert!(SystemRunner.run(&spec).is_err());
    }
}
