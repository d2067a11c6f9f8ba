//! Settings inspection command.

use anyhow::Result;
use clap::Args;
use stylist_core::Settings;

#[derive(Args)]
pub struct ConfigArgs {}

pub fn execute(_args: ConfigArgs, settings: &Settings) -> Result<()> {
    print!("{}", settings.to_toml()?);
    Ok(())
}
