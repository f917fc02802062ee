//! Local bootstrap for the IntentBot app: provision a Python environment,
//! install dependencies, launch the app, wait for it, open the browser.

pub mod bootstrap;
pub mod browser;
pub mod env;
pub mod error;
pub mod launch;
pub mod readiness;
pub mod runner;

pub use bootstrap::{
    resolve_env_dir, Bootstrap, BootstrapAbort, BootstrapPlan, BootstrapReport, FailurePolicy, Stage,
    Step, StepRecord, StepStatus,
};
pub use browser::{BrowserOpener, NoBrowser, SystemBrowser};
pub use error::BootstrapError;
pub use launch::{launch, AppProcess, LaunchTarget};
pub use readiness::{ProbeConfig, ProbeTarget, Readiness, ReadyState};
pub use runner::{CommandRunner, CommandSpec, StepOutput, SystemRunner};
