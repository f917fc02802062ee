use clap::{Parser, Subcommand};

/// IntentBot - intent-matching chat service with a one-command local setup
#[derive(Parser, Debug)]
#[command(name = "intentbot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set up and start the app: venv, pip install, launch, wait, open browser
    ///
    /// Every option falls back to its INTENTBOT_* variable, then to the
    /// built-in default (venv/, app.py, http://127.0.0.1:8000).
    Up {
        /// Environment directory (default: venv)
        #[arg(long, value_name = "DIR")]
        env_dir: Option<String>,

        /// Interpreter used to create the environment (default: python3/python on PATH)
        #[arg(long, value_name = "PYTHON")]
        python: Option<String>,

        /// Whitespace-separated packages to install
        #[arg(long, value_name = "PACKAGES")]
        packages: Option<String>,

        /// Script run by the environment interpreter (default: app.py)
        #[arg(long, value_name = "FILE")]
        entry_point: Option<String>,

        /// URL opened in the browser (default: http://127.0.0.1:8000)
        #[arg(long)]
        url: Option<String>,

        /// Seconds to wait with --fixed-delay (default: 3)
        #[arg(long, value_name = "SECS")]
        delay_secs: Option<u64>,

        /// Wait a fixed delay instead of probing the app
        #[arg(long, default_value = "false")]
        fixed_delay: bool,

        /// Probe this HTTP path (e.g. /health) instead of a plain TCP connect
        #[arg(long, value_name = "PATH")]
        health_path: Option<String>,

        /// Launch this binary's own `serve` instead of the Python entry point (no venv)
        #[arg(long, default_value = "false")]
        native: bool,

        /// Abort at the first failed step instead of continuing
        #[arg(long, default_value = "false")]
        strict: bool,

        /// Stay attached: stop the app on Ctrl+C
        #[arg(long, default_value = "false")]
        attach: bool,

        /// Do not open a browser
        #[arg(long, default_value = "false")]
        no_browser: bool,
    },

    /// Run the chat service (POST /chat, POST /reload, GET /, GET /health)
    Serve {
        /// Bind host (default: 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (default: 8000)
        #[arg(long, short)]
        port: Option<u16>,

        /// Intents file (default: intents.json)
        #[arg(long, value_name = "FILE")]
        intents: Option<String>,

        /// Directory holding index.html and static assets (default: static)
        #[arg(long, value_name = "DIR")]
        static_dir: Option<String>,

        /// Minimum token-set ratio (0-100) for a fuzzy match (default: 70)
        #[arg(long)]
        fuzzy_threshold: Option<f64>,

        /// Minimum cosine similarity (0-1) for a TF-IDF match (default: 0.35)
        #[arg(long)]
        tfidf_threshold: Option<f64>,
    },

    /// Inspect or remove the provisioned environment
    Env {
        #[command(subcommand)]
        action: EnvAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum EnvAction {
    /// Show the environment manifest and installed packages
    Status {
        /// Environment directory (default: venv)
        #[arg(long, value_name = "DIR")]
        env_dir: Option<String>,

        /// Output as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Remove the environment directory
    Clean {
        /// Environment directory (default: venv)
        #[arg(long, value_name = "DIR")]
        env_dir: Option<String>,

        /// Show what would be removed
        #[arg(long, default_value = "false")]
        dry_run: bool,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_up_flags() {
        let cli = Cli::try_parse_from([
            "intentbot", "up", "--packages", "flask rapidfuzz", "--fixed-delay", "--delay-secs", "5", "--strict",
        ])
        .unwrap();
        match cli.command {
            Commands::Up {
                packages,
                fixed_delay,
                delay_secs,
                strict,
                native,
                ..
            } => {
                assert_eq!(packages.as_deref(), Some("flask rapidfuzz"));
                assert!(fixed_delay);
                assert_eq!(delay_secs, Some(5));
                assert!(strict);
                assert!(!native);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_env_clean() {
        let cli = Cli::try_parse_from(["intentbot", "env", "clean", "--dry-run"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Env {
                action: EnvAction::Clean { dry_run: true, force: false, .. }
            }
        ));
    }
}
