//! Build the isolated Python environment (venv) and install packages into it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::BootstrapError;
use crate::runner::{CommandRunner, CommandSpec};

/// Manifest file written into a freshly created environment.
pub const MANIFEST_FILE: &str = "intentbot-env.json";
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// Paths inside an environment directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvLayout {
    root: PathBuf,
}

impl EnvLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Existence of the directory is the only check (a broken venv is not detected).
    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Environment interpreter: `bin/python` (Unix) or `Scripts/python.exe` (Windows).
    pub fn python(&self) -> Option<PathBuf> {
        let unix = self.root.join("bin").join("python");
        if unix.exists() {
            return Some(unix);
        }
        let windows = self.root.join("Scripts").join("python.exe");
        if windows.exists() {
            return Some(windows);
        }
        None
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// A venv marker (`pyvenv.cfg`) or our manifest is present.
    pub fn looks_like_env(&self) -> bool {
        self.root.join("pyvenv.cfg").is_file() || self.manifest_path().is_file()
    }
}

/// Named, versioned description of how an environment was provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvManifest {
    pub schema_version: u32,
    pub name: String,
    pub interpreter: String,
    pub packages: Vec<String>,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
}

impl EnvManifest {
    pub fn new(name: &str, interpreter: &str, packages: &[String]) -> Self {
        Self {
            schema_version: MANIFEST_SCHEMA_VERSION,
            name: name.to_string(),
            interpreter: interpreter.to_string(),
            packages: packages.to_vec(),
            fingerprint: fingerprint(interpreter, packages),
            created_at: Utc::now(),
        }
    }

    pub fn read(layout: &EnvLayout) -> Option<Self> {
        let content = std::fs::read_to_string(layout.manifest_path()).ok()?;
        match serde_json::from_str(&content) {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::warn!(path = %layout.manifest_path().display(), error = %e, "Ignoring unreadable environment manifest");
                None
            }
        }
    }

    pub fn write(&self, layout: &EnvLayout) -> Result<(), BootstrapError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| BootstrapError::Io(std::io::Error::other(e)))?;
        std::fs::write(layout.manifest_path(), json)?;
        Ok(())
    }
}

/// SHA-256 over the interpreter name and the sorted package list.
pub fn fingerprint(interpreter: &str, packages: &[String]) -> String {
    use sha2::{Digest, Sha256};
    let interpreter_name = Path::new(interpreter)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| interpreter.to_string());
    let mut sorted: Vec<String> = packages.iter().map(|p| p.to_lowercase()).collect();
    sorted.sort();
    sorted.dedup();

    let mut hasher = Sha256::new();
    hasher.update(interpreter_name.as_bytes());
    for p in &sorted {
        hasher.update(b"\0");
        hasher.update(p.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Outcome of [`ensure_environment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    /// Directory already existed; its manifest, if any
    Reused(Option<EnvManifest>),
}

/// Resolve the interpreter used to create the environment.
///
/// An explicit choice is used as-is; otherwise `python3`, `python` (and `py`
/// on Windows) are looked up on PATH.
pub fn resolve_interpreter(configured: Option<&str>) -> Result<PathBuf, BootstrapError> {
    if let Some(name) = configured {
        return Ok(PathBuf::from(name));
    }
    let candidates: &[&str] = if cfg!(windows) {
        &["python", "py", "python3"]
    } else {
        &["python3", "python"]
    };
    for name in candidates {
        if let Ok(path) = which::which(name) {
            tracing::debug!(interpreter = %path.display(), "Discovered Python interpreter");
            return Ok(path);
        }
    }
    Err(BootstrapError::InterpreterNotFound {
        tried: candidates.join(", "),
    })
}

/// Create the environment unless the directory already exists.
///
/// An existing directory is left untouched, manifest included. A fingerprint
/// mismatch against `packages` is only logged.
pub fn ensure_environment<R: CommandRunner + ?Sized>(
    runner: &R,
    layout: &EnvLayout,
    interpreter: &Path,
    packages: &[String],
) -> Result<Provisioned, BootstrapError> {
    if layout.exists() {
        let manifest = EnvManifest::read(layout);
        if let Some(ref m) = manifest {
            let current = fingerprint(&interpreter.to_string_lossy(), packages);
            if m.fingerprint != current {
                tracing::warn!(
                    env = %layout.root().display(),
                    provisioned = ?m.packages,
                    requested = ?packages,
                    "Environment was provisioned with a different package set; remove it to rebuild"
                );
            }
        }
        tracing::info!(env = %layout.root().display(), "Reusing existing environment");
        return Ok(Provisioned::Reused(manifest));
    }

    let spec = CommandSpec::new(interpreter)
        .args(["-m", "venv"])
        .arg(layout.root().to_string_lossy().to_string());
    tracing::info!(command = %spec.display(), "Creating environment");
    let out = runner.run(&spec).map_err(|e| BootstrapError::EnvCreate {
        path: layout.root().to_path_buf(),
        reason: e.to_string(),
    })?;
    if !out.success {
        return Err(BootstrapError::EnvCreate {
            path: layout.root().to_path_buf(),
            reason: out.failure_reason(),
        });
    }

    if layout.exists() {
        let name = layout
            .root()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "venv".to_string());
        let manifest = EnvManifest::new(&name, &interpreter.to_string_lossy(), packages);
        if let Err(e) = manifest.write(layout) {
            tracing::warn!(error = %e, "Could not write environment manifest");
        }
    }
    Ok(Provisioned::Created)
}

/// Upgrade pip, then install `packages` (unpinned) with `python -m pip`.
///
/// Both commands are always attempted; the first failure is returned.
pub fn install_dependencies<R: CommandRunner + ?Sized>(
    runner: &R,
    python: &Path,
    packages: &[String],
) -> Result<(), BootstrapError> {
    let upgrade = CommandSpec::new(python).args(["-m", "pip", "install", "--upgrade", "pip"]);
    let mut first_err = run_install(runner, &upgrade).err();

    if packages.is_empty() {
        tracing::info!("No packages configured; skipping install");
    } else {
        let install = CommandSpec::new(python)
            .args(["-m", "pip", "install"])
            .args(packages.iter().cloned());
        if let Err(e) = run_install(runner, &install) {
            first_err.get_or_insert(e);
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn run_install<R: CommandRunner + ?Sized>(runner: &R, spec: &CommandSpec) -> Result<(), BootstrapError> {
    tracing::info!(command = %spec.display(), "Installing");
    let out = runner.run(spec).map_err(|e| BootstrapError::Install {
        command: spec.display(),
        reason: e.to_string(),
    })?;
    if out.success {
        Ok(())
    } else {
        Err(BootstrapError::Install {
            command: spec.display(),
            reason: out.failure_reason(),
        })
    }
}

/// One row of `pip list`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
}

/// Query the environment's installed packages via `pip list --format=json`.
pub fn installed_packages<R: CommandRunner + ?Sized>(
    runner: &R,
    python: &Path,
) -> Result<Vec<InstalledPackage>, BootstrapError> {
    let spec = CommandSpec::new(python)
        .args(["-m", "pip", "list", "--format=json", "--disable-pip-version-check"])
        .captured();
    let out = runner.run(&spec).map_err(|e| BootstrapError::Install {
        command: spec.display(),
        reason: e.to_string(),
    })?;
    if !out.success {
        return Err(BootstrapError::Install {
            command: spec.display(),
            reason: out.failure_reason(),
        });
    }
    parse_pip_list(&out.stdout)
}

pub fn parse_pip_list(json: &str) -> Result<Vec<InstalledPackage>, BootstrapError> {
    serde_json::from_str(json.trim()).map_err(|e| BootstrapError::PipList(e.to_string()))
}

/// Requested packages missing from `installed` (case- and `-`/`_`-insensitive).
pub fn missing_packages<'a>(requested: &'a [String], installed: &[InstalledPackage]) -> Vec<&'a str> {
    let normalize = |s: &str| s.to_lowercase().replace('_', "-");
    requested
        .iter()
        .filter(|req| {
            let want = normalize(req);
            !installed.iter().any(|p| normalize(&p.name) == want)
        })
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::StepOutput;
    use std::cell::RefCell;

    /// Records commands; simulates `-m venv` by creating the target directory.
    #[derive(Default)]
    struct FakeRunner {
        calls: RefCell<Vec<CommandSpec>>,
        fail_when_contains: Option<&'static str>,
        stdout: String,
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, spec: &CommandSpec) -> std::io::Result<StepOutput> {
            self.calls.borrow_mut().push(spec.clone());
            if let Some(needle) = self.fail_when_contains {
                if spec.display().contains(needle) {
                    return Ok(StepOutput {
                        success: false,
                        code: Some(1),
                        stderr: format!("simulated failure for {}", needle),
                        ..Default::default()
                    });
                }
            }
            if spec.args.len() >= 3 && spec.args[0] == "-m" && spec.args[1] == "venv" {
                std::fs::create_dir_all(&spec.args[2])?;
            }
            Ok(StepOutput {
                success: true,
                code: Some(0),
                stdout: self.stdout.clone(),
                ..Default::default()
            })
        }
    }

    fn packages() -> Vec<String> {
        vec!["flask".to_string(), "rapidfuzz".to_string()]
    }

    #[test]
    fn test_looks_like_env_needs_marker() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = EnvLayout::new(tmp.path());
        std::fs::create_dir_all(tmp.path().join("src")).unwrap();
        assert!(!layout.looks_like_env());

        std::fs::write(tmp.path().join("pyvenv.cfg"), "home = /usr/bin\n").unwrap();
        assert!(layout.looks_like_env());

        let other = tempfile::tempdir().unwrap();
        let layout = EnvLayout::new(other.path());
        EnvManifest::new("venv", "python3", &["flask".to_string()]).write(&layout).unwrap();
        assert!(layout.looks_like_env());
    }

    #[test]
    fn test_ensure_environment_creates_and_writes_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = EnvLayout::new(tmp.path().join("venv"));
        let runner = FakeRunner::default();

        let result = ensure_environment(&runner, &layout, Path::new("python3"), &packages()).unwrap();
        assert_eq!(result, Provisioned::Created);
        assert_eq!(runner.calls.borrow().len(), 1);
        let manifest = EnvManifest::read(&layout).unwrap();
        assert_eq!(manifest.name, "venv");
        assert_eq!(manifest.schema_version, MANIFEST_SCHEMA_VERSION);
        assert_eq!(manifest.fingerprint, fingerprint("python3", &packages()));
    }

    #[test]
    fn test_ensure_environment_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = EnvLayout::new(tmp.path().join("venv"));
        let runner = FakeRunner::default();
        ensure_environment(&runner, &layout, Path::new("python3"), &packages()).unwrap();
        let before = std::fs::read_to_string(layout.manifest_path()).unwrap();

        let result = ensure_environment(&runner, &layout, Path::new("python3"), &packages()).unwrap();
        assert!(matches!(result, Provisioned::Reused(Some(_))));
        assert_eq!(runner.calls.borrow().len(), 1, "second run must not recreate");
        let after = std::fs::read_to_string(layout.manifest_path()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_existing_dir_without_manifest_is_reused() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = EnvLayout::new(tmp.path());
        let runner = FakeRunner::default();
        let result = ensure_environment(&runner, &layout, Path::new("python3"), &[]).unwrap();
        assert_eq!(result, Provisioned::Reused(None));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_ensure_environment_reports_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = EnvLayout::new(tmp.path().join("venv"));
        let runner = FakeRunner {
            fail_when_contains: Some("venv"),
            ..Default::default()
        };
        let err = ensure_environment(&runner, &layout, Path::new("python3"), &[]).unwrap_err();
        assert!(matches!(err, BootstrapError::EnvCreate { .. }));
        assert!(!layout.exists());
    }

    #[test]
    fn test_install_runs_upgrade_then_fixed_package_set() {
        let runner = FakeRunner::default();
        install_dependencies(&runner, Path::new("venv/bin/python"), &packages()).unwrap();
        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args, vec!["-m", "pip", "install", "--upgrade", "pip"]);
        assert_eq!(calls[1].args, vec!["-m", "pip", "install", "flask", "rapidfuzz"]);
    }

    #[test]
    fn test_install_attempts_both_commands_when_upgrade_fails() {
        let runner = FakeRunner {
            fail_when_contains: Some("--upgrade"),
            ..Default::default()
        };
        let err = install_dependencies(&runner, Path::new("python"), &packages()).unwrap_err();
        assert!(matches!(err, BootstrapError::Install { ref command, .. } if command.contains("--upgrade")));
        assert_eq!(runner.calls.borrow().len(), 2);
    }

    #[test]
    fn test_installed_packages_parses_pip_list() {
        let runner = FakeRunner {
            stdout: r#"[{"name": "Flask", "version": "3.0.3"}, {"name": "rapidfuzz", "version": "3.9.1"}]"#.to_string(),
            ..Default::default()
        };
        let installed = installed_packages(&runner, Path::new("python")).unwrap();
        assert_eq!(installed.len(), 2);
        assert!(runner.calls.borrow()[0].capture);

        let requested = vec!["flask".to_string(), "flask_cors".to_string(), "rapidfuzz".to_string()];
        assert_eq!(missing_packages(&requested, &installed), vec!["flask_cors"]);
    }

    #[test]
    fn test_parse_pip_list_rejects_garbage() {
        assert!(matches!(parse_pip_list("WARNING: ..."), Err(BootstrapError::PipList(_))));
    }

    #[test]
    fn test_fingerprint_ignores_order_and_case() {
        let a = fingerprint("/usr/bin/python3", &["Flask".to_string(), "rapidfuzz".to_string()]);
        let b = fingerprint("python3", &["rapidfuzz".to_string(), "flask".to_string()]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, fingerprint("python3", &["flask".to_string()]));
    }

    #[test]
    fn test_layout_resolves_interpreter() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = EnvLayout::new(tmp.path());
        assert!(layout.python().is_none());
        std::fs::create_dir_all(tmp.path().join("Scripts")).unwrap();
        std::fs::write(tmp.path().join("Scripts").join("python.exe"), "").unwrap();
        assert_eq!(layout.python(), Some(tmp.path().join("Scripts").join("python.exe")));
    }

    #[test]
    fn test_resolve_interpreter_prefers_configured() {
        assert_eq!(resolve_interpreter(Some("/opt/py/bin/python3.12")).unwrap(), PathBuf::from("/opt/py/bin/python3.12"));
    }
}
