//! Isolated dependency environment: venv creation, manifest, pip install.
//!
//! Callers pass a layout and a runner; this module never decides whether a
//! failure is fatal. That policy lives in `bootstrap`.

pub mod builder;

pub use builder::{
    ensure_environment, fingerprint, install_dependencies, installed_packages, missing_packages,
    parse_pip_list, resolve_interpreter, EnvLayout, EnvManifest, InstalledPackage, Provisioned,
};
