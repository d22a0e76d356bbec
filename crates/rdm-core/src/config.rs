use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Engine configuration loaded from `~/.config/rdm/config.toml`.
///
/// Read once at engine construction; every field can be changed at runtime
/// through the corresponding `Engine` setter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of jobs transferring at the same time.
    pub max_running_jobs: usize,
    /// Aggregate bandwidth cap in bytes per second, split evenly across running
    /// jobs. `<= 0` means unlimited.
    #[serde(default)]
    pub speed_limit: i64,
    /// Global switch; when false no job is allowed to run.
    #[serde(default = "default_true")]
    pub allow_download: bool,
    /// Coalesce progress notifications to at most one per job per interval.
    #[serde(default = "default_true")]
    pub avoid_frame_drop: bool,
    /// Minimum spacing of progress notifications per job, in milliseconds.
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_progress_interval_ms() -> u64 {
    200
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_running_jobs: 3,
            speed_limit: 0,
            allow_download: true,
            avoid_frame_drop: true,
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

impl EngineConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rdm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<EngineConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = EngineConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: EngineConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.max_running_jobs, 3);
        assert_eq!(cfg.speed_limit, 0);
        assert!(cfg.allow_download);
        assert!(cfg.avoid_frame_drop);
        assert_eq!(cfg.progress_interval(), Duration::from_millis(200));
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = EngineConfig {
            max_running_jobs: 5,
            speed_limit: 1_000_000,
            allow_download: false,
            avoid_frame_drop: false,
            progress_interval_ms: 50,
        };
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: EngineConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_only_required_values() {
        let toml = r#"
            max_running_jobs = 2
        "#;
        let cfg: EngineConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.max_running_jobs, 2);
        assert_eq!(cfg.speed_limit, 0);
        assert!(cfg.allow_download);
        assert!(cfg.avoid_frame_drop);
        assert_eq!(cfg.progress_interval_ms, 200);
    }

    #[test]
    fn config_toml_negative_speed_limit() {
        let toml = r#"
            max_running_jobs = 1
            speed_limit = -1
            avoid_frame_drop = false
        "#;
        let cfg: EngineConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.speed_limit, -1);
        assert!(!cfg.avoid_frame_drop);
    }
}
