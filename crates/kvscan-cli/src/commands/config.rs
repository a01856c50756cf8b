use std::path::PathBuf;

use anyhow::Result;
use kvscan_config::Config;

pub fn handle(config: &Config, explicit: Option<PathBuf>, path_only: bool) -> Result<()> {
    let path = explicit.unwrap_or_else(Config::config_path);

    if path_only {
        println!("{}", path.display());
        return Ok(());
    }

    // Compile first so a broken taxonomy is reported here, not mid-scan
    let taxonomy = config.taxonomy()?;

    println!("# {}", path.display());
    println!("# {} categories: {}", taxonomy.categories().len(), taxonomy.category_names().join(", "));
    println!();
    print!("{}", toml::to_string_pretty(config)?);

    Ok(())
}
