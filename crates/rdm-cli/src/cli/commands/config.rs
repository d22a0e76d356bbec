//! `rdm config` – show where the configuration lives and what it says.

use anyhow::Result;
use rdm_core::config::{self, EngineConfig};
use rdm_core::logging;

pub fn run_config(cfg: &EngineConfig) -> Result<()> {
    println!("# config: {}", config::config_path()?.display());
    println!("# log:    {}", logging::log_path()?.display());
    print!("{}", toml::to_string_pretty(cfg)?);
    Ok(())
}
