//! The bootstrap sequence.
//!
//! ```text
//! NotStarted → EnvironmentReady → DependenciesReady → Launched → Delayed → BrowserOpened
//! ```
//!
//! Strictly linear. Under [`FailurePolicy::Continue`] a failed step is logged
//! and recorded as masked, and the sequence moves on. [`FailurePolicy::Abort`]
//! stops at the first failure.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use intentbot_core::config::BootstrapConfig;
use thiserror::Error;

use crate::browser::BrowserOpener;
use crate::env::{ensure_environment, install_dependencies, resolve_interpreter, EnvLayout, Provisioned};
use crate::error::BootstrapError;
use crate::launch::{launch, AppProcess, LaunchTarget};
use crate::readiness::{wait_ready, ProbeConfig, ProbeTarget, Readiness, ReadyState};
use crate::runner::CommandRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log, record as masked, proceed
    Continue,
    /// Return at the first failed step
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    NotStarted,
    EnvironmentReady,
    DependenciesReady,
    Launched,
    Delayed,
    BrowserOpened,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::NotStarted => "not_started",
            Stage::EnvironmentReady => "environment_ready",
            Stage::DependenciesReady => "dependencies_ready",
            Stage::Launched => "launched",
            Stage::Delayed => "delayed",
            Stage::BrowserOpened => "browser_opened",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Provision,
    Install,
    Launch,
    Readiness,
    Browser,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Provision => "provision",
            Step::Install => "install",
            Step::Launch => "launch",
            Step::Readiness => "readiness",
            Step::Browser => "browser",
        }
    }

    /// Stage reached once this step has been attempted.
    fn reaches(&self) -> Stage {
        match self {
            Step::Provision => Stage::EnvironmentReady,
            Step::Install => Stage::DependenciesReady,
            Step::Launch => Stage::Launched,
            Step::Readiness => Stage::Delayed,
            Step::Browser => Stage::BrowserOpened,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Done(String),
    Skipped(String),
    Failed(String),
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Done(_) => "done",
            StepStatus::Skipped(_) => "skipped",
            StepStatus::Failed(_) => "failed",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            StepStatus::Done(s) | StepStatus::Skipped(s) | StepStatus::Failed(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub step: Step,
    pub status: StepStatus,
    pub duration: Duration,
}

#[derive(Debug)]
pub struct BootstrapReport {
    pub stage: Stage,
    pub steps: Vec<StepRecord>,
    /// Handle to the launched application, if the launch succeeded
    pub app: Option<AppProcess>,
    /// Time from application start to the browser-open call
    pub launch_to_browser: Option<Duration>,
    /// Step that stopped the sequence under [`FailurePolicy::Abort`]
    pub aborted_at: Option<Step>,
}

impl BootstrapReport {
    fn new() -> Self {
        Self {
            stage: Stage::NotStarted,
            steps: Vec::new(),
            app: None,
            launch_to_browser: None,
            aborted_at: None,
        }
    }

    /// Failed steps the sequence continued past. The aborting step is not masked.
    pub fn masked_failures(&self) -> Vec<&StepRecord> {
        self.steps
            .iter()
            .filter(|r| matches!(r.status, StepStatus::Failed(_)) && Some(r.step) != self.aborted_at)
            .collect()
    }

    /// No step failed, masked or aborting.
    pub fn is_clean(&self) -> bool {
        self.aborted_at.is_none() && self.masked_failures().is_empty()
    }

    pub fn step(&self, step: Step) -> Option<&StepRecord> {
        self.steps.iter().find(|r| r.step == step)
    }
}

/// Returned when [`FailurePolicy::Abort`] stops the sequence.
#[derive(Debug, Error)]
#[error("bootstrap aborted at {step} step: {error}")]
pub struct BootstrapAbort {
    pub step: Step,
    #[source]
    pub error: BootstrapError,
    pub report: BootstrapReport,
}

/// Everything the sequence needs, resolved from config and CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapPlan {
    pub env_dir: PathBuf,
    /// Interpreter for `-m venv`; `None` → discover on PATH
    pub python: Option<String>,
    pub packages: Vec<String>,
    pub target: LaunchTarget,
    /// Working directory for the launched app
    pub workdir: Option<PathBuf>,
    pub readiness: Readiness,
    pub url: String,
    pub policy: FailurePolicy,
    /// `false` skips environment + install (native launch)
    pub provision: bool,
}

impl BootstrapPlan {
    /// Plan for `<env python> <entry_point>` from config.
    ///
    /// `fixed_delay` selects a fixed pause; otherwise readiness is
    /// probed against the URL (or its health path).
    pub fn from_config(cfg: &BootstrapConfig, fixed_delay: bool) -> Self {
        let readiness = if fixed_delay {
            Readiness::FixedDelay(Duration::from_secs(cfg.ready_delay_secs))
        } else {
            Readiness::Probe {
                target: ProbeTarget::from_url(&cfg.url, cfg.health_path.as_deref()),
                config: ProbeConfig::default(),
            }
        };
        Self {
            env_dir: cfg.env_dir.clone(),
            python: cfg.python.clone(),
            packages: cfg.packages.clone(),
            target: LaunchTarget::Script {
                entry_point: PathBuf::from(&cfg.entry_point),
            },
            workdir: None,
            readiness,
            url: cfg.url.clone(),
            policy: if cfg.strict {
                FailurePolicy::Abort
            } else {
                FailurePolicy::Continue
            },
            provision: true,
        }
    }
}

pub struct Bootstrap<'a, R: ?Sized, B: ?Sized> {
    plan: &'a BootstrapPlan,
    runner: &'a R,
    browser: &'a B,
}

impl<'a, R, B> Bootstrap<'a, R, B>
where
    R: CommandRunner + ?Sized,
    B: BrowserOpener + ?Sized,
{
    pub fn new(plan: &'a BootstrapPlan, runner: &'a R, browser: &'a B) -> Self {
        Self {
            plan,
            runner,
            browser,
        }
    }

    pub fn run(&self) -> Result<BootstrapReport, BootstrapAbort> {
        let plan = self.plan;
        let mut report = BootstrapReport::new();
        let layout = EnvLayout::new(&plan.env_dir);
        let interpreter = if plan.provision || plan.target.needs_python() {
            self.interpreter()
        } else {
            PathBuf::from("python")
        };

        // 1. environment
        let started = Instant::now();
        let result = if plan.provision {
            ensure_environment(self.runner, &layout, &interpreter, &plan.packages).map(|p| match p {
                Provisioned::Created => {
                    StepStatus::Done(format!("created {}", layout.root().display()))
                }
                Provisioned::Reused(_) => {
                    StepStatus::Skipped(format!("{} already exists", layout.root().display()))
                }
            })
        } else {
            Ok(StepStatus::Skipped("native launch".to_string()))
        };
        self.finish(&mut report, Step::Provision, started, result)?;

        // 2. dependencies
        let env_python = layout.python();
        let python = env_python.clone().unwrap_or_else(|| interpreter.clone());
        let started = Instant::now();
        let result = if plan.provision {
            if env_python.is_none() {
                tracing::warn!(
                    env = %layout.root().display(),
                    python = %python.display(),
                    "Environment has no interpreter; using the base interpreter"
                );
            }
            install_dependencies(self.runner, &python, &plan.packages)
                .map(|()| StepStatus::Done(format!("installed {}", plan.packages.join(" "))))
        } else {
            Ok(StepStatus::Skipped("native launch".to_string()))
        };
        self.finish(&mut report, Step::Install, started, result)?;

        // 3. launch
        let started = Instant::now();
        let (program, args) = plan.target.resolve(&python);
        let result = launch(&program, &args, plan.workdir.as_deref()).map(|app| {
            let detail = format!("pid {} `{}`", app.id(), app.command());
            report.app = Some(app);
            StepStatus::Done(detail)
        });
        self.finish(&mut report, Step::Launch, started, result)?;

        // 4. readiness
        let started = Instant::now();
        let nothing_to_probe = matches!(plan.readiness, Readiness::Probe { .. }) && report.app.is_none();
        let result = if nothing_to_probe {
            Ok(StepStatus::Skipped("no application".to_string()))
        } else {
            wait_ready(&plan.readiness, report.app.as_mut()).map(|state| match state {
                ReadyState::Delayed(d) => StepStatus::Done(format!("waited {} ms", d.as_millis())),
                ReadyState::Ready { attempts, elapsed } => StepStatus::Done(format!(
                    "ready after {} attempt(s), {} ms",
                    attempts,
                    elapsed.as_millis()
                )),
            })
        };
        self.finish(&mut report, Step::Readiness, started, result)?;

        // 5. browser
        let started = Instant::now();
        report.launch_to_browser = report.app.as_ref().map(|a| a.started_at().elapsed());
        let result = self
            .browser
            .open(&plan.url)
            .map(|()| StepStatus::Done(plan.url.clone()));
        self.finish(&mut report, Step::Browser, started, result)?;

        Ok(report)
    }

    fn interpreter(&self) -> PathBuf {
        match resolve_interpreter(self.plan.python.as_deref()) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "Falling back to `python`");
                PathBuf::from("python")
            }
        }
    }

    fn finish(
        &self,
        report: &mut BootstrapReport,
        step: Step,
        started: Instant,
        result: Result<StepStatus, BootstrapError>,
    ) -> Result<(), BootstrapAbort> {
        let duration = started.elapsed();
        match result {
            Ok(status) => {
                tracing::debug!(step = %step, status = status.as_str(), detail = %status.detail(), "Step finished");
                report.steps.push(StepRecord {
                    step,
                    status,
                    duration,
                });
                report.stage = step.reaches();
                Ok(())
            }
            Err(error) => {
                report.steps.push(StepRecord {
                    step,
                    status: StepStatus::Failed(error.to_string()),
                    duration,
                });
                match self.plan.policy {
                    FailurePolicy::Continue => {
                        tracing::warn!(step = %step, error = %error, "Step failed; continuing (failure masked)");
                        report.stage = step.reaches();
                        Ok(())
                    }
                    FailurePolicy::Abort => {
                        if let Some(app) = report.app.as_mut() {
                            if let Err(e) = app.stop() {
                                tracing::warn!(error = %e, "Could not stop application after abort");
                            }
                        }
                        report.aborted_at = Some(step);
                        Err(BootstrapAbort {
                            step,
                            error,
                            report: std::mem::replace(report, BootstrapReport::new()),
                        })
                    }
                }
            }
        }
    }
}

/// Environment directory relative to `base` unless already absolute.
pub fn resolve_env_dir(base: &Path, env_dir: &Path) -> PathBuf {
    if env_dir.is_absolute() {
        env_dir.to_path_buf()
    } else {
        base.join(env_dir)
    }
}
