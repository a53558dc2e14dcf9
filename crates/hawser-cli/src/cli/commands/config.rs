//! `hawser config` – print the effective configuration or its path.

use anyhow::Result;
use hawser_core::config::{self, HawserConfig};

pub fn run_config(cfg: &HawserConfig, path_only: bool) -> Result<()> {
    if path_only {
        println!("{}", config::config_path()?.display());
    } else {
        print!("{}", toml::to_string_pretty(cfg)?);
    }
    Ok(())
}
