//! Environment management commands: inspect or remove the provisioned venv.
//!
//! The environment lives in `venv/` (or `$INTENTBOT_ENV_DIR`) relative to the
//! working directory, with an `intentbot-env.json` manifest written when
//! `intentbot up` created it.

use anyhow::{bail, Context, Result};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

use intentbot_env::env::{installed_packages, missing_packages, EnvLayout, EnvManifest};
use intentbot_env::{resolve_env_dir, SystemRunner};

use crate::config::BootstrapConfig;

fn env_dir(cli_value: Option<String>) -> Result<PathBuf> {
    let dir = cli_value
        .map(PathBuf::from)
        .unwrap_or_else(|| BootstrapConfig::from_env().env_dir);
    let cwd = std::env::current_dir().context("Cannot determine working directory")?;
    Ok(resolve_env_dir(&cwd, &dir))
}

/// `intentbot env status`
pub fn cmd_status(env_dir_arg: Option<String>, json_output: bool) -> Result<()> {
    let layout = EnvLayout::new(env_dir(env_dir_arg)?);
    let requested = BootstrapConfig::from_env().packages;

    if !layout.exists() {
        if json_output {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "path": layout.root(),
                    "exists": false,
                }))?
            );
        } else {
            eprintln!("No environment at {} (run `intentbot up`)", layout.root().display());
        }
        return Ok(());
    }

    let manifest = EnvManifest::read(&layout);
    let python = layout.python();
    let installed = match python {
        Some(ref py) => match installed_packages(&SystemRunner, py) {
            Ok(list) => Some(list),
            Err(e) => {
                tracing::warn!(error = %e, "Could not list installed packages");
                None
            }
        },
        None => None,
    };
    let missing: Vec<&str> = installed
        .as_ref()
        .map(|list| missing_packages(&requested, list))
        .unwrap_or_default();

    if json_output {
        let v = json!({
            "path": layout.root(),
            "exists": true,
            "size_bytes": dir_size(layout.root()),
            "python": python,
            "manifest": manifest,
            "installed": installed,
            "missing": missing,
        });
        println!("{}", serde_json::to_string_pretty(&v)?);
        return Ok(());
    }

    eprintln!("🗂  Environment {}", layout.root().display());
    eprintln!("  Size:        {}", format_size(dir_size(layout.root())));
    match python {
        Some(ref py) => eprintln!("  Interpreter: {}", py.display()),
        None => eprintln!("  Interpreter: (missing, environment looks broken)"),
    }
    match manifest {
        Some(ref m) => {
            eprintln!("  Created:     {} with {}", m.created_at.to_rfc3339(), m.interpreter);
            eprintln!("  Packages:    {}", m.packages.join(" "));
            eprintln!("  Fingerprint: {}", &m.fingerprint[..m.fingerprint.len().min(12)]);
        }
        None => eprintln!("  Manifest:    none (created outside intentbot)"),
    }
    if let Some(ref list) = installed {
        eprintln!();
        eprintln!("  Installed ({}):", list.len());
        for p in list {
            eprintln!("    • {} {}", p.name, p.version);
        }
    }
    if !missing.is_empty() {
        eprintln!();
        eprintln!("⚠ Missing requested packages: {}", missing.join(", "));
    }
    Ok(())
}

/// `intentbot env clean`
pub fn cmd_clean(env_dir_arg: Option<String>, dry_run: bool, force: bool) -> Result<()> {
    let root = env_dir(env_dir_arg)?;
    let layout = EnvLayout::new(&root);

    if !layout.exists() {
        eprintln!("No environment found at {}", root.display());
        return Ok(());
    }
    if !layout.looks_like_env() {
        bail!(
            "{} is not a Python environment (no pyvenv.cfg or {}); refusing to remove it",
            root.display(),
            intentbot_env::env::builder::MANIFEST_FILE
        );
    }

    let size = dir_size(&root);
    eprintln!("🗂  Environment {} ({})", root.display(), format_size(size));

    if dry_run {
        eprintln!();
        eprintln!("(Dry run, nothing removed. Remove --dry-run to delete.)");
        return Ok(());
    }

    if !force {
        eprint!("\nRemove this environment? [y/N] ");
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            eprintln!("Cancelled.");
            return Ok(());
        }
    }

    fs::remove_dir_all(&root).with_context(|| format!("Failed to remove {}", root.display()))?;
    eprintln!("✓ Removed {}, freed {}", root.display(), format_size(size));
    Ok(())
}

/// Total size of a directory tree. Symlinks are not followed.
fn dir_size(path: &Path) -> u64 {
    let mut total: u64 = 0;
    if let Ok(entries) = fs::read_dir(path) {
        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else { continue };
            if file_type.is_dir() {
                total += dir_size(&entry.path());
            } else if file_type.is_file() {
                if let Ok(meta) = entry.metadata() {
                    total += meta.len();
                }
            }
        }
    }
    total
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_dir_size_counts_nested_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("lib/site")).unwrap();
        fs::write(tmp.path().join("a.txt"), "12345").unwrap();
        fs::write(tmp.path().join("lib/site/b.txt"), "123").unwrap();
        assert_eq!(dir_size(tmp.path()), 8);
    }

    #[cfg(unix)]
    #[test]
    fn test_dir_size_does_not_follow_symlinks() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("lib")).unwrap();
        fs::write(tmp.path().join("lib/mod.py"), "1234").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("lib"), tmp.path().join("lib64")).unwrap();
        assert_eq!(dir_size(tmp.path()), 4);
    }

    fn fake_venv(root: &Path) {
        fs::create_dir_all(root.join("bin")).unwrap();
        fs::write(root.join("pyvenv.cfg"), "home = /usr/bin\n").unwrap();
    }

    #[test]
    fn test_clean_force_removes_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let venv = tmp.path().join("venv");
        fake_venv(&venv);
        cmd_clean(Some(venv.to_string_lossy().to_string()), false, true).unwrap();
        assert!(!venv.exists());
    }

    #[test]
    fn test_clean_refuses_non_environment_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let project = tmp.path().join("my_project");
        fs::create_dir_all(project.join("src")).unwrap();
        fs::write(project.join("src/main.py"), "print('hi')").unwrap();

        let err = cmd_clean(Some(project.to_string_lossy().to_string()), false, true).unwrap_err();
        assert!(err.to_string().contains("not a Python environment"));
        assert!(project.join("src/main.py").exists());
    }

    #[test]
    fn test_clean_dry_run_keeps_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let venv = tmp.path().join("venv");
        fake_venv(&venv);
        cmd_clean(Some(venv.to_string_lossy().to_string()), true, false).unwrap();
        assert!(venv.exists());
    }
}
