//! Web server command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use stylist_core::Settings;

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides the settings file)
    #[arg(long)]
    pub port: Option<u16>,

    /// Host to bind to (overrides the settings file)
    #[arg(long)]
    pub host: Option<String>,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

pub async fn execute(args: ServeArgs, mut settings: Settings) -> Result<()> {
    if let Some(host) = args.host {
        settings.server.host = host;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }

    println!();
    println!(
        "  {} {}",
        "👗 Stylist".cyan().bold(),
        "Fashion Recommender".bold()
    );
    println!();
    println!(
        "  {}        http://{}:{}",
        "App".green(),
        settings.server.host,
        settings.server.port
    );
    println!(
        "  {}     {} / {} / {}",
        "Models".green(),
        settings.models.visual_model,
        settings.models.search_model,
        settings.models.report_model
    );
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    stylist_web::run_server(settings).await?;

    Ok(())
}
