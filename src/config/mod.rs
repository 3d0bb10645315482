mod types;

pub use types::*;

use crate::Result;
use std::env;
use tracing::debug;

pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

    debug!("Loading configuration from: {}", config_path);

    // A missing config file is not fatal: every field has a default that
    // matches the shipped model layout. A file that exists but fails to
    // parse is still an error.
    if !std::path::Path::new(&config_path).exists() {
        debug!("No configuration file found, using defaults");
        return Ok(Config::default());
    }

    let config_str = tokio::fs::read_to_string(&config_path).await?;
    let config: Config = serde_yaml::from_str(&config_str)?;

    Ok(config)
}
