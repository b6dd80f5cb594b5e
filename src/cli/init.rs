//! Init command implementation

use colored::Colorize;

use crate::cli::GlobalOptions;
use crate::config::Config;
use crate::error::{Error, Result};

/// Write a default configuration file, keeping any CLI/env overrides
pub fn run(opts: &GlobalOptions, force: bool) -> Result<()> {
    let path = Config::resolve_path(opts.config_ref())?;

    if path.exists() && !force {
        return Err(Error::Other(format!(
            "Configuration already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    let mut config = Config::default();
    opts.apply_overrides(&mut config);
    config.validate()?;
    config.save_to(&path)?;

    println!(
        "{} Wrote configuration to {}",
        "✓".green(),
        path.display().to_string().cyan()
    );
    Ok(())
}
