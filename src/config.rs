/// Command-line and environment configuration.

use clap::Parser;
use directories::BaseDirs;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::{ClientError, Result};

pub const DEFAULT_SERVER: &str = "http://localhost:5000";
pub const STATE_DB_FILE: &str = "state.db";
const STATE_DIR_NAME: &str = ".coshop";

#[derive(Parser, Debug, Clone)]
#[command(name = "coshop")]
#[command(about = "CoShop - shop together in a shared room")]
pub struct Config {
    /// Room service URL
    #[arg(long, env = "COSHOP_BASE_URL", default_value = DEFAULT_SERVER)]
    pub server: String,

    /// Real-time channel URL (default: the server URL with a ws scheme and /ws path)
    #[arg(long)]
    pub socket: Option<String>,

    /// Config directory for state database (default: ~/.coshop)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// HTTP request timeout in seconds (default: no timeout)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Enable verbose logging (DEBUG level)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn socket_url(&self) -> Result<String> {
        match &self.socket {
            Some(socket) => Ok(socket.clone()),
            None => derive_socket_url(&self.server),
        }
    }

    pub fn state_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.config {
            return Ok(dir.clone());
        }
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| ClientError::ConfigError("Failed to get home directory".to_string()))?;
        Ok(base_dirs.home_dir().join(STATE_DIR_NAME))
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.state_dir()?.join(STATE_DB_FILE))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// `http://host:port/base` becomes `ws://host:port/base/ws`
pub fn derive_socket_url(server: &str) -> Result<String> {
    let mut url = Url::parse(server)
        .map_err(|e| ClientError::ConfigError(format!("Invalid server URL {}: {}", server, e)))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ClientError::ConfigError(format!(
                "Unsupported server URL scheme: {}",
                other
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| ClientError::ConfigError(format!("Cannot derive socket URL from {}", server)))?;
    url.path_segments_mut()
        .map_err(|_| ClientError::ConfigError(format!("Cannot derive socket URL from {}", server)))?
        .pop_if_empty()
        .push("ws");

    Ok(url.to_string())
}
