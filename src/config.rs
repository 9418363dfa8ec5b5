//! Application configuration.
//!
//! Configuration is read from a TOML file and can be partially specified;
//! every field has a default matching the development setup. The structure
//! is intentionally flat: one server, one database, one credential pair.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// The address the HTTP server binds to.
    pub listen_addr: SocketAddr,
    /// SQLite database URL, e.g. `sqlite://mygames.db`.
    pub database_url: String,
    /// Directory uploaded game imagery is stored in. Created on demand.
    pub upload_dir: PathBuf,
    /// Whether the session cookie is marked `Secure`. Disable for plain
    /// HTTP development servers.
    pub secure_cookies: bool,
    /// The administrator credential pair.
    pub admin: AdminConfig,
}

/// The credential pair accepted by the login form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            database_url: "sqlite://mygames.db".to_owned(),
            upload_dir: PathBuf::from("static/images"),
            secure_cookies: false,
            admin: AdminConfig::default(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_owned(),
            password: "password123".to_owned(),
        }
    }
}

impl AppConfig {
    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or contains unknown keys.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reads and parses the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.listen_addr.port(), 5000);
        assert_eq!(config.admin.username, "admin");
        assert_eq!(config.admin.password, "password123");
    }

    #[test]
    fn partial_config_overrides_defaults() {
        let config = AppConfig::from_toml(
            r#"
            listen_addr = "0.0.0.0:8000"
            database_url = "sqlite::memory:"

            [admin]
            password = "hunter2"
            "#,
        )
        .unwrap();

        assert_eq!(config.listen_addr, SocketAddr::from(([0, 0, 0, 0], 8000)));
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.admin.username, "admin");
        assert_eq!(config.admin.password, "hunter2");
        assert_eq!(config.upload_dir, PathBuf::from("static/images"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = AppConfig::from_toml("databse_url = \"sqlite://typo.db\"");
        assert!(result.is_err());
    }
}
