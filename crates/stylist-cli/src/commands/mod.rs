//! CLI command definitions and handlers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use stylist_core::Settings;

pub mod config;
pub mod serve;

/// Stylist - personalised fashion reports from a photo and your preferences
#[derive(Parser)]
#[command(name = "stylist")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a TOML settings file (defaults apply when omitted)
    #[arg(short, long, global = true, env = "STYLIST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve(serve::ServeArgs),

    /// Print the effective settings as TOML
    Config(config::ConfigArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let settings = load_settings(self.config.as_deref())?;

        match self.command {
            Commands::Serve(args) => serve::execute(args, settings).await,
            Commands::Config(args) => config::execute(args, &settings),
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    Settings::load_or_default(path).with_context(|| match path {
        Some(path) => format!("Failed to load settings from {}", path.display()),
        None => "Failed to build default settings".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from([
            "stylist", "serve", "--host", "0.0.0.0", "--port", "9000", "--log-file", "serve.log",
        ])
        .unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
                assert_eq!(args.port, Some(9000));
                assert_eq!(args.log_file, Some(PathBuf::from("serve.log")));
            }
            Commands::Config(_) => panic!("expected serve"),
        }
    }

    #[test]
    fn test_config_flag_is_global() {
        let cli = Cli::try_parse_from(["stylist", "config", "--config", "stylist.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("stylist.toml")));
    }

    #[test]
    fn test_load_settings_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9100").unwrap();

        let settings = load_settings(Some(file.path())).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.host, "127.0.0.1");
    }

    #[test]
    fn test_load_settings_reports_missing_file() {
        let err = load_settings(Some(Path::new("/nonexistent/stylist.toml"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/stylist.toml"));
    }
}
