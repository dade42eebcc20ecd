//! XDG-compliant path resolution for the chatcsv client.
//!
//! `ChatPaths` locates the per-user config and state directories. The client's
//! persistent storage (name, theme, history, interests) lives under
//! `$XDG_STATE_HOME/chatcsv/storage/`.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors from path resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(chatcsv::paths::no_home),
        help("Set the HOME environment variable, or pass `--storage-dir` explicitly.")
    )]
    NoHome,

    #[error("failed to create directory: {path}")]
    #[diagnostic(
        code(chatcsv::paths::create_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type PathResult<T> = std::result::Result<T, PathError>;

/// Global XDG-compliant directories for chatcsv.
#[derive(Debug, Clone)]
pub struct ChatPaths {
    /// `$XDG_CONFIG_HOME/chatcsv/`
    pub config_dir: PathBuf,
    /// `$XDG_STATE_HOME/chatcsv/`
    pub state_dir: PathBuf,
}

impl ChatPaths {
    /// Resolve XDG directories from environment variables with standard fallbacks.
    pub fn resolve() -> PathResult<Self> {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .map_err(|_| PathError::NoHome)?;

        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".config"))
            .join("chatcsv");

        let state_dir = std::env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".local/state"))
            .join("chatcsv");

        Ok(Self {
            config_dir,
            state_dir,
        })
    }

    /// Directory holding one file per client storage key.
    pub fn storage_dir(&self) -> PathBuf {
        self.state_dir.join("storage")
    }

    /// Path to the client config file.
    pub fn client_config_file(&self) -> PathBuf {
        self.config_dir.join("client.toml")
    }

    /// Create all base directories. Idempotent.
    pub fn ensure_dirs(&self) -> PathResult<()> {
        for dir in [&self.config_dir, &self.state_dir, &self.storage_dir()] {
            std::fs::create_dir_all(dir).map_err(|e| PathError::CreateDir {
                path: dir.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }
}
