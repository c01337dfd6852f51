/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed server configuration
[POS]:    Configuration layer - server setup
[UPDATE]: When adding new configuration options
*/

use std::path::Path;

use anyhow::Context;
use openkitx403::AuthConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration for the reference server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Socket address to bind (e.g., "127.0.0.1:8000")
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Authenticator settings
    #[serde(default = "default_auth")]
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            auth: default_auth(),
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:8000".to_string()
}

/// Routes the reference server advertises as public
pub const PUBLIC_PATHS: [&str; 2] = ["/", "/health"];

fn default_auth() -> AuthConfig {
    AuthConfig::default().with_excluded_paths(PUBLIC_PATHS)
}

impl ServerConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(content).context("parse config yaml")?;
        config.auth.validate().context("invalid auth section")?;
        Ok(config)
    }
}
