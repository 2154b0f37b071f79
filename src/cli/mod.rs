//! Command-line interface for the warden binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Runtime governor for autonomous agents.
#[derive(Debug, Parser)]
#[command(name = "warden", version, about)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP enforcement proxy.
    Serve {
        /// Policy file producing the governor profile.
        #[arg(long)]
        policy: Option<PathBuf>,

        /// Preset used when no policy file is given.
        #[arg(long)]
        preset: Option<String>,

        /// Listen port.
        #[arg(long)]
        port: Option<u16>,

        /// Audit chain file location.
        #[arg(long)]
        audit: Option<PathBuf>,
    },

    /// Verify an audit chain file.
    ///
    /// Exit codes: 0 valid, 1 invalid, 2 I/O error.
    Verify {
        /// Audit chain file to check.
        path: PathBuf,
    },

    /// Print a named preset profile as YAML.
    Profile {
        /// Preset name: conservative, balanced, or aggressive.
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_serve() {
        let cli = Cli::parse_from(["warden", "serve", "--port", "9000", "--preset", "balanced"]);
        match cli.command {
            Commands::Serve { port, preset, .. } => {
                assert_eq!(port, Some(9000));
                assert_eq!(preset.as_deref(), Some("balanced"));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_cli_parses_verify() {
        let cli = Cli::parse_from(["warden", "verify", "audit.log"]);
        match cli.command {
            Commands::Verify { path } => assert_eq!(path, PathBuf::from("audit.log")),
            _ => panic!("expected verify"),
        }
    }

    #[test]
    fn test_cli_parses_profile() {
        let cli = Cli::parse_from(["warden", "profile", "aggressive"]);
        match cli.command {
            Commands::Profile { name } => assert_eq!(name, "aggressive"),
            _ => panic!("expected profile"),
        }
    }

    #[test]
    fn test_cli_structure_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
