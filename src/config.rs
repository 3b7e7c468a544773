//! Configuration for the taskcrew server.
//!
//! Settings load from a YAML file (explicit `--config` path, `taskcrew.yaml`
//! in the working directory, or the per-user config directory), with
//! environment-variable overrides for the secrets that should never live in
//! a checked-in file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    /// SMTP settings; when absent, reset links are logged instead of mailed.
    pub smtp: Option<SmtpConfig>,
}

/// HTTP listener and storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Base URL the reset-password link points at (the frontend).
    pub frontend_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 5000,
            db_path: PathBuf::from("taskcrew.db"),
            frontend_url: "http://localhost:5174".to_string(),
        }
    }
}

/// Secrets for token signing and admin registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub admin_registration_key: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me".to_string(),
            admin_registration_key: "ADMIN_SECRET_2025".to_string(),
        }
    }
}

/// Outbound SMTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

fn default_smtp_port() -> u16 {
    587
}

impl Config {
    /// Load configuration from the first path that exists, then apply
    /// environment overrides. A missing file is not an error; defaults apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_path(explicit) {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                serde_yaml::from_str(&raw)
                    .with_context(|| format!("invalid config file {}", path.display()))?
            }
            None => Config::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        let local = PathBuf::from("taskcrew.yaml");
        if local.exists() {
            return Some(local);
        }
        let user = dirs::config_dir()?.join("taskcrew").join("config.yaml");
        if user.exists() {
            return Some(user);
        }
        None
    }

    /// Environment variables override file values for deployable secrets.
    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("TASKCREW_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(key) = std::env::var("TASKCREW_ADMIN_KEY") {
            self.auth.admin_registration_key = key;
        }
        if let Ok(url) = std::env::var("TASKCREW_FRONTEND_URL") {
            self.server.frontend_url = url;
        }
        if let Ok(host) = std::env::var("TASKCREW_SMTP_HOST") {
            let smtp = self.smtp.get_or_insert(SmtpConfig {
                host: String::new(),
                port: default_smtp_port(),
                username: String::new(),
                password: String::new(),
                from: String::new(),
            });
            smtp.host = host;
            if let Ok(port) = std::env::var("TASKCREW_SMTP_PORT")
                && let Ok(port) = port.parse()
            {
                smtp.port = port;
            }
            if let Ok(username) = std::env::var("TASKCREW_SMTP_USERNAME") {
                smtp.username = username;
            }
            if let Ok(password) = std::env::var("TASKCREW_SMTP_PASSWORD") {
                smtp.password = password;
            }
            if let Ok(from) = std::env::var("TASKCREW_SMTP_FROM") {
                smtp.from = from;
            }
        }
    }

    /// Create the database's parent directory if needed.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        Ok(())
    }
}
