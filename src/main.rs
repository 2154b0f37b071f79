//! Warden CLI entry point

use anyhow::{Context, Result};
use clap::Parser;

use warden::cli::{Cli, Commands};
use warden::domain::models::Profile;
use warden::infrastructure::audit;
use warden::infrastructure::audit::AuditLog;
use warden::infrastructure::config::ConfigLoader;
use warden::infrastructure::http::{serve, AppState, ToolRegistry};
use warden::infrastructure::logging::init_logging;
use warden::services::Kernel;
use warden::AuditError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Verify is a standalone check with fixed exit codes; it neither
    // loads configuration nor initializes logging.
    if let Commands::Verify { path } = &cli.command {
        match audit::verify(path) {
            Ok(summary) => {
                println!(
                    "valid chain: {} entries, head {}",
                    summary.entries, summary.head_hash
                );
                return Ok(());
            }
            Err(AuditError::Io(err)) => {
                eprintln!("I/O error: {err}");
                std::process::exit(2);
            }
            Err(err) => {
                eprintln!("invalid chain: {err}");
                std::process::exit(1);
            }
        }
    }

    if let Commands::Profile { name } = &cli.command {
        let profile = Profile::preset(name)
            .with_context(|| format!("unknown preset: {name} (expected conservative, balanced, or aggressive)"))?;
        print!("{}", serde_yaml::to_string(&profile)?);
        return Ok(());
    }

    let Commands::Serve {
        policy,
        preset,
        port,
        audit,
    } = cli.command
    else {
        unreachable!("all other commands handled above");
    };

    let mut config = ConfigLoader::load().context("Failed to load configuration")?;
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(audit) = audit {
        config.audit_path = audit;
    }
    if let Some(policy) = policy {
        config.policy_path = Some(policy);
    }
    if let Some(preset) = preset {
        config.preset = preset;
    }

    let _log_guard = init_logging(&config.logging).context("Failed to initialize logging")?;

    let profile = match &config.policy_path {
        Some(path) => ConfigLoader::load_policy(path)?,
        None => Profile::preset(&config.preset)
            .with_context(|| format!("unknown preset: {}", config.preset))?,
    };
    ConfigLoader::validate_policy(&profile)?;

    let audit_log = AuditLog::open(&config.audit_path)
        .with_context(|| format!("Failed to open audit log {}", config.audit_path.display()))?;

    let kernel = Kernel::new(config.agent_id.clone(), profile).with_audit(audit_log);
    let state = AppState::new(kernel, ToolRegistry::new());

    serve(config.port, state).await
}
