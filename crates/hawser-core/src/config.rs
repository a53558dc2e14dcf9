use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Base URL used when no config file exists yet.
pub const DEFAULT_URL: &str = "http://localhost:8080/media";

/// Configuration loaded from `~/.config/hawser/config.toml`.
///
/// Passed explicitly into [`crate::resolver::Resolver`]; nothing in the core
/// reads configuration from global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HawserConfig {
    /// Base URL of the media store (e.g. `https://git-media.example.com/media`).
    pub url: String,
    /// Seconds allowed for establishing the TCP/TLS connection.
    pub connect_timeout_secs: u64,
    /// Hard wall-clock limit for a single GET, in seconds.
    pub timeout_secs: u64,
    /// Abort when throughput stays below this many bytes/s for `low_speed_time_secs`.
    pub low_speed_limit: u32,
    pub low_speed_time_secs: u64,
    /// Maximum redirects the transport follows before giving up.
    pub max_redirects: u32,
    /// Optional User-Agent override; defaults to `hawser/<version>`.
    pub user_agent: Option<String>,
}

impl Default for HawserConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            connect_timeout_secs: 30,
            timeout_secs: 3600,
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
            max_redirects: 10,
            user_agent: None,
        }
    }
}

impl HawserConfig {
    /// Config with defaults and the given base URL.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// User-Agent sent on every request.
    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("hawser/{}", env!("CARGO_PKG_VERSION")))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hawser")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HawserConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = HawserConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}

/// Load configuration from an explicit path.
pub fn load_from(path: &std::path::Path) -> Result<HawserConfig> {
    let data = fs::read_to_string(path)?;
    let cfg: HawserConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = HawserConfig::default();
        assert_eq!(cfg.url, DEFAULT_URL);
        assert_eq!(cfg.connect_timeout_secs, 30);
        assert_eq!(cfg.timeout_secs, 3600);
        assert_eq!(cfg.max_redirects, 10);
        assert!(cfg.user_agent.is_none());
        assert!(cfg.user_agent().starts_with("hawser/"));
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = HawserConfig::with_url("https://media.example.com/media");
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: HawserConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_partial_uses_defaults() {
        let toml = r#"
            url = "http://127.0.0.1:9000/media"
            max_redirects = 3
        "#;
        let cfg: HawserConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.url, "http://127.0.0.1:9000/media");
        assert_eq!(cfg.max_redirects, 3);
        assert_eq!(cfg.connect_timeout_secs, 30);
        assert_eq!(cfg.low_speed_time_secs, 60);
    }

    #[test]
    fn config_user_agent_override() {
        let toml = r#"
            url = "http://127.0.0.1:9000/media"
            user_agent = "custom-agent/1.0"
        "#;
        let cfg: HawserConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.user_agent(), "custom-agent/1.0");
    }

    #[test]
    fn load_from_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "url = \"http://store.local/media\"\n").unwrap();
        let cfg = load_from(&path).unwrap();
        assert_eq!(cfg.url, "http://store.local/media");
    }

    #[test]
    fn load_from_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "url = [").unwrap();
        assert!(load_from(&path).is_err());
    }
}
