//! Server and client configuration.
//!
//! Both configs are plain serde structs persisted as TOML, with per-field
//! defaults so a partial file (or no file at all) is valid. The server config
//! additionally honours `PORT` and `CHATCSV_BIND` from the environment; command
//! line flags are applied by the binaries on top of that.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Port used when neither the config file nor `PORT` sets one.
pub const DEFAULT_PORT: u16 = 3000;

/// Errors from loading configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(chatcsv::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}")]
    #[diagnostic(
        code(chatcsv::config::parse),
        help("Check the TOML syntax in the config file: {message}")
    )]
    Parse { path: String, message: String },

    #[error("invalid port \"{value}\"")]
    #[diagnostic(
        code(chatcsv::config::port),
        help("PORT must be an integer between 0 and 65535.")
    )]
    InvalidPort { value: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Configuration for the `chatcsvd` server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Root for general static assets.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
    /// Root for standalone pages, served under `/pages/`.
    #[serde(default = "default_pages_dir")]
    pub pages_dir: PathBuf,
    /// Keyword rule table.
    #[serde(default = "default_responses")]
    pub responses: PathBuf,
    /// Append-only interaction log.
    #[serde(default = "default_chatlog")]
    pub chatlog: PathBuf,
}

fn default_bind() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}
fn default_pages_dir() -> PathBuf {
    PathBuf::from("pages")
}
fn default_responses() -> PathBuf {
    PathBuf::from("responses.csv")
}
fn default_chatlog() -> PathBuf {
    PathBuf::from("chatlog.csv")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            public_dir: default_public_dir(),
            pages_dir: default_pages_dir(),
            responses: default_responses(),
            chatlog: default_chatlog(),
        }
    }
}

impl ServerConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        load_toml(path)
    }

    /// Apply `PORT` and `CHATCSV_BIND` from the process environment.
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides from an arbitrary lookup.
    ///
    /// An empty `PORT` counts as unset.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort { value: port.clone() })?;
        }
        if let Some(bind) = lookup("CHATCSV_BIND").filter(|b| !b.trim().is_empty()) {
            self.bind = bind.trim().to_string();
        }
        Ok(())
    }

    /// `bind:port` string for the listener.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Configuration for the `chatcsv` client CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the chat server.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Override for the storage directory (defaults to the XDG state dir).
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
}

fn default_server_url() -> String {
    format!("http://127.0.0.1:{DEFAULT_PORT}")
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            storage_dir: None,
        }
    }
}

impl ClientConfig {
    /// Load from a TOML file, or defaults if the file does not exist.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        load_toml(path)
    }
}

fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> ConfigResult<T> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
