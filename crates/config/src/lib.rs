//! The config module handles the user's settings file.
//!
//! ```toml
//! [server]
//! url = "http://127.0.0.1:2001"
//! request_timeout_ms = 5000
//!
//! [session]
//! retry_interval_ms = 2000
//! ```
//!
//! Every field is optional.

use std::{
    io::{Read, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use eyre::Context;
use serde::{Deserialize, Serialize};

/// Where the debug server listens unless configured otherwise.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:2001";

const DEFAULT_RETRY_INTERVAL_MS: u64 = 2000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub url: String,
    /// No timeout when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_string(),
            request_timeout_ms: None,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay between attempts to open a session
    pub retry_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
        }
    }
}

impl SessionConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

/// `<config dir>/uvm-dbg/config.toml`, if the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("uvm-dbg").join("config.toml"))
}

pub fn load(mut reader: impl Read) -> eyre::Result<Config> {
    let mut contents = String::new();
    reader
        .read_to_string(&mut contents)
        .context("reading config")?;
    let config = toml::from_str(&contents).context("parsing config")?;
    Ok(config)
}

pub fn load_from(path: impl AsRef<Path>) -> eyre::Result<Config> {
    let path = path.as_ref();
    let f = std::fs::File::open(path)
        .with_context(|| format!("opening config file {}", path.display()))?;
    let config = load(f).with_context(|| format!("loading config file {}", path.display()))?;
    Ok(config)
}

/// Load the config at `path`, or the defaults if there is no file there.
pub fn load_or_default(path: impl AsRef<Path>) -> eyre::Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    tracing::debug!(path = %path.display(), "loading config file");
    load_from(path)
}

pub fn save(config: &Config, mut writer: impl Write) -> eyre::Result<()> {
    let contents = toml::to_string_pretty(config).context("serialising config")?;
    writer
        .write_all(contents.as_bytes())
        .context("writing config")?;
    Ok(())
}

pub fn save_to(config: &Config, path: impl AsRef<Path>) -> eyre::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating config dir {}", parent.display()))?;
    }
    let f = std::fs::File::create(path).context("creating file for saving")?;
    save(config, &f).context("saving config")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn empty_file_gives_defaults() {
        let config = load(Cursor::new("")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.server.url, "http://127.0.0.1:2001");
        assert_eq!(config.server.request_timeout(), None);
        assert_eq!(config.session.retry_interval(), Duration::from_millis(2000));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = load(Cursor::new("[server]\nrequest_timeout_ms = 500\n")).unwrap();
        assert_eq!(config.server.url, DEFAULT_SERVER_URL);
        assert_eq!(
            config.server.request_timeout(),
            Some(Duration::from_millis(500))
        );
        assert_eq!(config.session.retry_interval_ms, 2000);
    }

    #[test]
    fn load_malformed_toml() {
        let result = load(Cursor::new("[server\nurl = "));
        assert!(result.is_err());
    }

    #[test]
    fn wrong_type_is_an_error() {
        let result = load(Cursor::new("[session]\nretry_interval_ms = \"soon\"\n"));
        assert!(result.is_err());
    }

    #[test]
    fn save_to_and_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config {
            server: ServerConfig {
                url: "http://10.0.0.2:2001".to_string(),
                request_timeout_ms: Some(1500),
            },
            session: SessionConfig {
                retry_interval_ms: 100,
            },
        };
        save_to(&config, &path).unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert!(load_from(&path).is_err());
        assert_eq!(load_or_default(&path).unwrap(), Config::default());
    }

    #[test]
    fn default_path_ends_with_file_name() {
        if let Some(path) = default_path() {
            assert!(path.ends_with("uvm-dbg/config.toml"));
        }
    }
}
