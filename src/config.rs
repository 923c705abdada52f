use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use directories_next::ProjectDirs;
use serde::Deserialize;
use tracing::{info, warn};

/// Secret used when none is configured. Only suitable for development.
const DEV_SECRET: &str = "dev_only_replace_me";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind: IpAddr,
    pub port: u16,
    pub admin_port: Option<u16>,
    pub secret: Option<String>,
    pub database: Database,
    pub limits: Limits,
    pub ui: Ui,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_content_size: usize,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: IpAddr::from([127, 0, 0, 1]),
            port: 8080,
            admin_port: None,
            secret: None,
            database: Database::default(),
            limits: Limits::default(),
            ui: Ui::default(),
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        Database {
            url: "sqlite://data/pastes.db?mode=rwc".into(),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_content_size: 512 * 1024,
            sweep_interval_secs: 10 * 60,
        }
    }
}

impl Config {
    /// Load the config from an explicit path, or from the first `config.toml`
    /// found in the working directory or the platform config directory.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => Some(path.to_owned()),
            None => default_config_path(),
        };

        let mut config = match path {
            Some(path) => {
                info!("loading config from {}", path.display());
                let source = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                Config::parse(&source)?
            }
            None => Config::default(),
        };

        if let Ok(secret) = std::env::var("SNIPBIN_SECRET") {
            config.secret = Some(secret);
        }

        Ok(config)
    }

    pub fn parse(source: &str) -> anyhow::Result<Self> {
        toml::from_str(source).context("failed to deserialize config")
    }

    /// The HMAC key for auth cookies.
    pub fn secret(&self) -> &[u8] {
        match self.secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret.as_bytes(),
            _ => DEV_SECRET.as_bytes(),
        }
    }

    pub fn warn_insecure(&self) {
        if self.secret.as_deref().map_or(true, str::is_empty) {
            warn!("no secret configured, auth cookies are signed with a development key");
        }
    }

    /// Request bodies may carry a little form overhead beyond the content itself.
    pub fn max_body_size(&self) -> usize {
        self.limits.max_content_size + 1024
    }
}

fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from("config.toml");
    if local.is_file() {
        return Some(local);
    }

    ProjectDirs::from("", "", "snipbin")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.admin_port, None);
        assert_eq!(config.limits.max_content_size, 512 * 1024);
        assert_eq!(config.limits.sweep_interval_secs, 600);
        assert_eq!(config.secret(), DEV_SECRET.as_bytes());
    }

    #[test]
    fn partial_sections() {
        let config = Config::parse(
            r#"
            port = 9000
            admin_port = 9001
            secret = "hunter2"

            [limits]
            max_content_size = 10

            [ui]
            dir = "web/dist"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.admin_port, Some(9001));
        assert_eq!(config.secret(), b"hunter2");
        assert_eq!(config.limits.max_content_size, 10);
        assert_eq!(config.limits.sweep_interval_secs, 600);
        assert_eq!(config.max_body_size(), 1034);
        assert_eq!(config.ui.dir, Some(PathBuf::from("web/dist")));
        assert_eq!(config.database.url, "sqlite://data/pastes.db?mode=rwc");
    }

    #[test]
    fn empty_secret_falls_back() {
        let config = Config::parse(r#"secret = """#).unwrap();
        assert_eq!(config.secret(), DEV_SECRET.as_bytes());
    }
}
