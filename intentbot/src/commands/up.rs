//! `intentbot up` — provision, install, launch, wait, open browser.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use intentbot_env::{
    AppProcess, Bootstrap, BootstrapPlan, BootstrapReport, BrowserOpener, LaunchTarget, NoBrowser,
    ProbeTarget, StepStatus, SystemBrowser, SystemRunner,
};

use crate::config::{parse_package_list, BootstrapConfig};
use crate::observability;

/// CLI values for `up`; `None` keeps the env/default value.
#[derive(Debug, Default, Clone)]
pub struct UpOptions {
    pub env_dir: Option<String>,
    pub python: Option<String>,
    pub packages: Option<String>,
    pub entry_point: Option<String>,
    pub url: Option<String>,
    pub delay_secs: Option<u64>,
    pub fixed_delay: bool,
    pub health_path: Option<String>,
    pub native: bool,
    pub strict: bool,
    pub attach: bool,
    pub no_browser: bool,
}

/// Layer CLI values over the environment config.
pub fn apply_overrides(mut cfg: BootstrapConfig, opts: &UpOptions) -> BootstrapConfig {
    if let Some(ref d) = opts.env_dir {
        cfg.env_dir = PathBuf::from(d);
    }
    if let Some(ref p) = opts.python {
        cfg.python = Some(p.clone());
    }
    if let Some(ref pkgs) = opts.packages {
        cfg.packages = parse_package_list(pkgs);
    }
    if let Some(ref e) = opts.entry_point {
        cfg.entry_point = e.clone();
    }
    if let Some(ref u) = opts.url {
        cfg.url = u.clone();
    }
    if let Some(s) = opts.delay_secs {
        cfg.ready_delay_secs = s;
    }
    if let Some(ref h) = opts.health_path {
        cfg.health_path = Some(h.clone());
    }
    if opts.strict {
        cfg.strict = true;
    }
    cfg
}

/// Port of the URL's authority (scheme default when absent).
fn url_port(url: &str) -> Option<u16> {
    match ProbeTarget::from_url(url, None) {
        ProbeTarget::Tcp(authority) => authority.rsplit_once(':').and_then(|(_, p)| p.parse().ok()),
        ProbeTarget::Http(_) => None,
    }
}

pub fn build_plan(cfg: &BootstrapConfig, opts: &UpOptions) -> Result<BootstrapPlan> {
    let mut plan = BootstrapPlan::from_config(cfg, opts.fixed_delay);
    if opts.native {
        let exe = std::env::current_exe().context("Cannot locate the intentbot executable")?;
        let mut args = vec!["serve".to_string()];
        if let Some(port) = url_port(&cfg.url) {
            args.push("--port".to_string());
            args.push(port.to_string());
        }
        plan.target = LaunchTarget::Command { program: exe, args };
        plan.provision = false;
    }
    Ok(plan)
}

pub fn cmd_up(opts: UpOptions) -> Result<()> {
    let cfg = apply_overrides(BootstrapConfig::from_env(), &opts);
    let plan = build_plan(&cfg, &opts)?;
    tracing::debug!(?plan, "Bootstrap plan");

    let runner = SystemRunner;
    let browser: &dyn BrowserOpener = if opts.no_browser {
        &NoBrowser
    } else {
        &SystemBrowser
    };

    let mut report = match Bootstrap::new(&plan, &runner, browser).run() {
        Ok(report) => report,
        Err(abort) => {
            print_summary(&abort.report);
            observability::audit_bootstrap(&abort.report);
            return Err(anyhow::Error::new(abort));
        }
    };

    print_summary(&report);
    observability::audit_bootstrap(&report);

    match report.app.as_mut() {
        Some(app) if opts.attach => attach(app),
        Some(app) => {
            eprintln!(
                "Application keeps running in the background (pid {}). Stop it with your OS tools or rerun with --attach.",
                app.id()
            );
            Ok(())
        }
        None => Ok(()),
    }
}

fn print_summary(report: &BootstrapReport) {
    eprint!("{}", summary_text(report));
}

fn summary_text(report: &BootstrapReport) -> String {
    let mut out = String::from("\n");
    for record in &report.steps {
        let mark = match record.status {
            StepStatus::Done(_) => "✓",
            StepStatus::Skipped(_) => "•",
            StepStatus::Failed(_) => "✗",
        };
        out.push_str(&format!(
            "  {} {:<10} {} ({} ms)\n",
            mark,
            record.step.as_str(),
            record.status.detail(),
            record.duration.as_millis()
        ));
    }
    if let Some(step) = report.aborted_at {
        out.push_str(&format!("\n✗ Stopped at the {} step (strict mode).\n", step.as_str()));
    }
    let masked = report.masked_failures();
    if !masked.is_empty() {
        let names: Vec<&str> = masked.iter().map(|r| r.step.as_str()).collect();
        out.push_str(&format!(
            "\n⚠ {} step(s) failed and were skipped over: {}. Use --strict to stop at the first failure.\n",
            masked.len(),
            names.join(", ")
        ));
    }
    out.push('\n');
    out
}

/// Block until the app exits or Ctrl+C, then stop it.
fn attach(app: &mut AppProcess) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_clone.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    tracing::info!(pid = app.id(), "Attached to application. Press Ctrl+C to stop.");
    loop {
        if let Some(status) = app.exit_status() {
            tracing::info!(status = %status, "Application exited");
            return Ok(());
        }
        if shutdown.load(Ordering::SeqCst) {
            app.stop().context("Failed to stop application")?;
            tracing::info!("Application stopped");
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(200));
    }
}
