//! Configuration management for the level editor server
//!
//! Loaded once at startup into an immutable [`ServerConfig`]. Precedence,
//! lowest first: built-in defaults, `config.toml`, `WELTMEISTER__*`
//! environment variables, then the platform `PORT` variable.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config";
const ENV_PREFIX: &str = "WELTMEISTER";
const PORT_OVERRIDE_VAR: &str = "PORT";

/// Complete server configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// IP address to bind the HTTP listener
    pub bind_address: String,
    pub port: u16,

    /// Root directory; bounds every read, listing and glob
    pub server_root: String,

    /// Directory under the root that the save endpoint may write to
    pub writable_dir: String,

    /// Log one line per request
    pub log_requests: bool,

    /// Served for `/`; must exist under the root at startup
    pub index_file: String,
    /// Served for `/editor`
    pub editor_file: String,

    pub api: ApiConfig,
}

/// Exact request paths of the file-management API
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub save: String,
    pub browse: String,
    pub glob: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8000,
            server_root: ".".to_string(),
            writable_dir: "lib/game/levels".to_string(),
            log_requests: false,
            index_file: "index.html".to_string(),
            editor_file: "weltmeister.html".to_string(),
            api: ApiConfig {
                save: "/lib/weltmeister/api/save.php".to_string(),
                browse: "/lib/weltmeister/api/browse.php".to_string(),
                glob: "/lib/weltmeister/api/glob.php".to_string(),
            },
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(CONFIG_FILE, std::env::var(PORT_OVERRIDE_VAR).ok())
    }

    /// Load from an explicit config file path (extension optional) with an
    /// explicit port override.
    pub fn load_from(config_path: &str, port_override: Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let settings = Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("server_root", defaults.server_root)?
            .set_default("writable_dir", defaults.writable_dir)?
            .set_default("log_requests", defaults.log_requests)?
            .set_default("index_file", defaults.index_file)?
            .set_default("editor_file", defaults.editor_file)?
            .set_default("api.save", defaults.api.save)?
            .set_default("api.browse", defaults.api.browse)?
            .set_default("api.glob", defaults.api.glob)?
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let mut config: ServerConfig = settings.try_deserialize()?;

        if let Some(port) = port_override {
            config.port = port.trim().parse().map_err(|_| {
                ConfigError::Message(format!("Invalid {PORT_OVERRIDE_VAR} value: {port:?}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        if self.server_root.is_empty() {
            return Err(ConfigError::Message("server_root cannot be empty".into()));
        }

        if self.writable_dir.is_empty() || Path::new(&self.writable_dir).is_absolute() {
            return Err(ConfigError::Message(
                "writable_dir must be a non-empty path relative to server_root".into(),
            ));
        }

        if self.index_file.is_empty() || self.editor_file.is_empty() {
            return Err(ConfigError::Message(
                "index_file and editor_file cannot be empty".into(),
            ));
        }

        let endpoints = [&self.api.save, &self.api.browse, &self.api.glob];
        if let Some(bad) = endpoints.iter().find(|e| !e.starts_with('/')) {
            return Err(ConfigError::Message(format!(
                "API endpoint must start with '/': {bad:?}"
            )));
        }
        // Route syntax characters would turn an endpoint into a pattern.
        if let Some(bad) = endpoints.iter().find(|e| e.contains(['{', '}', '*', ':'])) {
            return Err(ConfigError::Message(format!(
                "API endpoint must be a literal path: {bad:?}"
            )));
        }
        if endpoints[0] == endpoints[1] || endpoints[0] == endpoints[2] || endpoints[1] == endpoints[2]
        {
            return Err(ConfigError::Message(
                "API endpoints must be distinct".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as socket address
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Get server root as PathBuf
    pub fn server_root_path(&self) -> PathBuf {
        PathBuf::from(&self.server_root)
    }

    pub fn writable_dir_path(&self) -> PathBuf {
        PathBuf::from(&self.writable_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.socket_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn file_values_and_port_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.toml");
        fs::write(
            &path,
            "server_root = \"/srv/game\"\nlog_requests = true\n\n[api]\nsave = \"/api/save\"\n",
        )
        .unwrap();

        let config =
            ServerConfig::load_from(path.to_str().unwrap(), Some("9090".to_string())).unwrap();
        assert_eq!(config.server_root, "/srv/game");
        assert!(config.log_requests);
        assert_eq!(config.api.save, "/api/save");
        assert_eq!(config.api.glob, "/lib/weltmeister/api/glob.php");
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        let result = ServerConfig::load_from(missing.to_str().unwrap(), Some("http".into()));
        assert!(result.is_err());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = ServerConfig::default();
        config.port = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.writable_dir = "/tmp/levels".into();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.api.glob = config.api.browse.clone();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.api.save = "save.php".into();
        assert!(config.validate().is_err());
    }
}
