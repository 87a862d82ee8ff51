use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Server configuration, loaded from YAML with environment overrides.
///
/// ```yaml
/// server:
///   listen_addr: "0.0.0.0:8080"
///   max_connections: 1024
///   idle_timeout_secs: 30
/// static_files:
///   root: "/srv/www"
///   reserved_paths: ["/server-status"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Connections beyond this many are refused at accept time.
    pub max_connections: usize,
    /// A connection waiting this long for readiness is closed.
    pub idle_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            max_connections: 65536,
            idle_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Document root; request targets are appended to it verbatim.
    pub root: PathBuf,
    /// Targets that are never served from disk.
    pub reserved_paths: Vec<String>,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./root"),
            reserved_paths: vec!["/server-status".to_string()],
        }
    }
}

impl Config {
    /// Loads the configuration the binary runs with.
    ///
    /// The file named by the first command line argument, or else by
    /// `FILAMENT_CONFIG`, is read if present. `LISTEN` and `DOC_ROOT`
    /// override the listen address and document root.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::args()
            .nth(1)
            .or_else(|| std::env::var("FILAMENT_CONFIG").ok());

        let cfg = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        Ok(cfg.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        let cfg = serde_yaml::from_str(text).context("Failed to parse YAML")?;
        Ok(cfg)
    }

    /// Applies `LISTEN` and `DOC_ROOT` as looked up through `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(addr) = lookup("LISTEN") {
            self.server.listen_addr = addr;
        }
        if let Some(root) = lookup("DOC_ROOT") {
            self.static_files.root = PathBuf::from(root);
        }
        self
    }
}
