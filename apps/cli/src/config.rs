//! Client configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/dropshare/client.toml`
//! - Windows: `%APPDATA%/dropshare/client.toml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding the configured origin.
pub const ORIGIN_ENV: &str = "DROPSHARE_ORIGIN";

const DEFAULT_ORIGIN: &str = "http://localhost:8080";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Origin of the dropshare server, e.g. `https://drop.example.com`.
    #[serde(default = "default_origin")]
    pub origin: String,
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.into()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: ClientConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = ClientConfig::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Picks the origin to use: command-line flag, then environment, then
    /// this file's value.
    pub fn resolve_origin(&self, flag: Option<String>, env: Option<String>) -> String {
        flag.or(env.filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| self.origin.clone())
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("dropshare")
            .join("client.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("dropshare").join("client.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/dropshare/client.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        assert_eq!(ClientConfig::default().origin, "http://localhost:8080");
    }

    #[test]
    fn empty_toml_uses_default_origin() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn config_path_not_empty() {
        let path = config_path().unwrap();
        assert!(path.to_string_lossy().contains("dropshare"));
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("client.toml");

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        let config = ClientConfig {
            origin: "https://drop.example.com".into(),
        };

        config.save_to(&path).unwrap();
        assert_eq!(ClientConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn flag_beats_env_beats_file() {
        let file = ClientConfig {
            origin: "http://file:1".into(),
        };
        assert_eq!(
            file.resolve_origin(Some("http://flag:1".into()), Some("http://env:1".into())),
            "http://flag:1"
        );
        assert_eq!(
            file.resolve_origin(None, Some("http://env:1".into())),
            "http://env:1"
        );
        assert_eq!(file.resolve_origin(None, None), "http://file:1");
        assert_eq!(file.resolve_origin(None, Some("  ".into())), "http://file:1");
    }
}
