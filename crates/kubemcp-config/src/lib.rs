pub mod sections;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use sections::{ClientConfig, KubeconfigConfig, LoggingConfig, ServerConfig, Transport};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub kubeconfig: KubeconfigConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

pub const DEFAULT_CONFIG: &str = include_str!("defaults.toml");

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded defaults must parse")
    }
}

impl AppConfig {
    /// Defaults overlaid with the user file, if one exists and parses.
    pub fn load() -> Self {
        let mut config = Self::default();

        let path = Self::default_path();
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                    Ok(user) => config.merge(user),
                    Err(e) => eprintln!("Warning: invalid config at {}: {e}", path.display()),
                },
                Err(e) => eprintln!("Warning: could not read {}: {e}", path.display()),
            }
        }

        config
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let mut config = Self::default();
        let contents = std::fs::read_to_string(path)?;
        let user: AppConfig = toml::from_str(&contents)?;
        config.merge(user);
        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("kubemcp").join("config.toml")
    }

    fn merge(&mut self, user: AppConfig) {
        self.server = user.server;
        self.client = user.client;
        self.logging = user.logging;
        if user.kubeconfig.path.is_some() {
            self.kubeconfig.path = user.kubeconfig.path;
        }
    }

    /// Never zero; a zero setting falls back to one second.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.client.connect_timeout_secs.max(1))
    }

    /// The configured kubeconfig with a leading `~/` expanded.
    pub fn kubeconfig_path(&self) -> Option<PathBuf> {
        self.kubeconfig.path.as_deref().map(expand_home)
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests;
