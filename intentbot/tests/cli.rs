use std::process::Command;

fn intentbot() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_intentbot"));
    cmd.env_remove("RUST_LOG").env_remove("INTENTBOT_QUIET");
    cmd
}

#[cfg(unix)]
#[test]
fn env_status_json_stdout_stays_parseable_with_json_logs() {
    let tmp = tempfile::tempdir().unwrap();
    let venv = tmp.path().join("venv");
    std::fs::create_dir_all(venv.join("bin")).unwrap();
    // Present but not executable: listing packages fails and logs a warning.
    std::fs::write(venv.join("bin").join("python"), "").unwrap();

    let output = intentbot()
        .current_dir(tmp.path())
        .env("INTENTBOT_LOG_JSON", "1")
        .args(["env", "status", "--json", "--env-dir"])
        .arg(&venv)
        .output()
        .expect("run intentbot env status");
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Could not list installed packages"), "stderr: {}", stderr);

    let v: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is one JSON document");
    assert_eq!(v["exists"], true);
    assert!(v["installed"].is_null());
}

#[test]
fn env_clean_refuses_plain_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let project = tmp.path().join("project");
    std::fs::create_dir_all(&project).unwrap();
    std::fs::write(project.join("app.py"), "print('hi')").unwrap();

    let output = intentbot()
        .current_dir(tmp.path())
        .args(["env", "clean", "--force", "--env-dir"])
        .arg(&project)
        .output()
        .expect("run intentbot env clean");
    assert!(!output.status.success());
    assert!(project.join("app.py").exists());
}
