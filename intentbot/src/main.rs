mod cli;
mod commands;
mod config;
mod observability;
mod server;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, EnvAction};

use commands::serve::ServeOptions;
use commands::up::UpOptions;

fn main() -> Result<()> {
    observability::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Up {
            env_dir,
            python,
            packages,
            entry_point,
            url,
            delay_secs,
            fixed_delay,
            health_path,
            native,
            strict,
            attach,
            no_browser,
        } => {
            commands::up::cmd_up(UpOptions {
                env_dir,
                python,
                packages,
                entry_point,
                url,
                delay_secs,
                fixed_delay,
                health_path,
                native,
                strict,
                attach,
                no_browser,
            })?;
        }
        Commands::Serve {
            host,
            port,
            intents,
            static_dir,
            fuzzy_threshold,
            tfidf_threshold,
        } => {
            commands::serve::cmd_serve(ServeOptions {
                host,
                port,
                intents,
                static_dir,
                fuzzy_threshold,
                tfidf_threshold,
            })?;
        }
        Commands::Env { action } => match action {
            EnvAction::Status { env_dir, json } => commands::env::cmd_status(env_dir, json)?,
            EnvAction::Clean {
                env_dir,
                dry_run,
                force,
            } => commands::env::cmd_clean(env_dir, dry_run, force)?,
        },
    }

    Ok(())
}
