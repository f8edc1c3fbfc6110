use anyhow::Result;
use std::path::Path;

use rep_coach::CoachConfig;

use crate::config;

pub async fn show_config(explicit: Option<&Path>) -> Result<()> {
    let config = config::load(explicit)?;
    let config_str = toml::to_string_pretty(&config)?;

    println!("Current Configuration");
    println!("────────────────────────────────");
    println!();
    println!("{}", config_str);

    Ok(())
}

pub async fn init_config(explicit: Option<&Path>, force: bool) -> Result<()> {
    let config_file = config::resolve_config_file(explicit)?;

    if config_file.exists() && !force {
        println!(
            "Configuration file already exists at: {}",
            config_file.display()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    CoachConfig::default().save(&config_file)?;

    println!("✓ Configuration initialized at: {}", config_file.display());

    Ok(())
}
