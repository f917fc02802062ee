//! Open a URL in the default browser.

use std::process::{Command, Stdio};

use crate::error::BootstrapError;

pub trait BrowserOpener {
    fn open(&self, url: &str) -> Result<(), BootstrapError>;
}

/// Uses the OS facility: `open` (macOS), `xdg-open` (Linux), `cmd /C start` (Windows).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl SystemBrowser {
    fn command(url: &str) -> Option<Command> {
        if cfg!(target_os = "macos") {
            let mut c = Command::new("open");
            c.arg(url);
            Some(c)
        } else if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            // The empty string is the window title `start` expects before the target.
            c.args(["/C", "start", "", url]);
            Some(c)
        } else if cfg!(unix) {
            let mut c = Command::new("xdg-open");
            c.arg(url);
            Some(c)
        } else {
            None
        }
    }
}

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &str) -> Result<(), BootstrapError> {
        let cmd = Self::command(url).ok_or_else(|| BootstrapError::Browser {
            url: url.to_string(),
            reason: "no browser launcher for this platform".to_string(),
        })?;
        run_launcher(cmd, url)?;
        tracing::info!(url = %url, "Opened browser");
        Ok(())
    }
}

/// `open`, `xdg-open` and `start` hand off and exit quickly; wait for their status.
fn run_launcher(mut cmd: Command, url: &str) -> Result<(), BootstrapError> {
    let status = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| BootstrapError::Browser {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    if !status.success() {
        return Err(BootstrapError::Browser {
            url: url.to_string(),
            reason: format!("launcher exited with {}", status),
        });
    }
    Ok(())
}

/// Does nothing; for `--no-browser` and headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBrowser;

impl BrowserOpener for NoBrowser {
    fn open(&self, url: &str) -> Result<(), BootstrapError> {
        tracing::info!(url = %url, "Browser opening disabled; visit the URL manually");
        Ok(())
    }
}
