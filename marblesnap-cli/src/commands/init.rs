//! Init command - initialize configuration file.

use clap::Args;

use marblesnap::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Arguments for the init command.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config.ini with defaults
    #[arg(long)]
    pub force: bool,
}

/// Run the init command.
pub fn run(args: InitArgs) -> Result<(), CliError> {
    let path = config_file_path();

    if path.exists() && !args.force {
        // Rewrite with current values so new keys appear with their comments.
        let config = ConfigFile::load()?;
        config.save()?;
        println!("Configuration file already exists: {}", path.display());
        println!("Missing keys were filled in. Use --force to reset to defaults.");
        return Ok(());
    }

    ConfigFile::default().save()?;

    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to set the output directory, capture interval and viewer URL.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}
