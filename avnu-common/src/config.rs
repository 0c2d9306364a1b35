//! Configuration loading and root folder resolution

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::retry::RetryPolicy;
use crate::{Error, Result};

/// Default bind address for the marketplace API
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5780";

/// Service configuration
///
/// Resolution priority for the root folder, highest first:
/// 1. Command-line argument
/// 2. `AVNU_ROOT` environment variable
/// 3. TOML config file (`~/.config/avnu/config.toml`)
/// 4. OS-dependent compiled default
#[derive(Debug, Clone)]
pub struct AvnuConfig {
    /// Folder holding the database and any generated artifacts
    pub root_folder: PathBuf,
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Base URL of the hosted serverless functions (assistant, email)
    pub functions_base_url: String,
    /// EventBus buffer size per subscriber
    pub event_capacity: usize,
    /// Bounded-retry policy for best-effort notification delivery
    pub notify_retry: RetryPolicy,
}

/// On-disk TOML shape; every field optional so a partial file is fine
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    root_folder: Option<String>,
    bind_address: Option<String>,
    functions_base_url: Option<String>,
    event_capacity: Option<usize>,
    notify_max_attempts: Option<u32>,
    notify_backoff_secs: Option<u64>,
}

impl AvnuConfig {
    /// Resolve configuration from CLI argument, environment, config file and
    /// compiled defaults
    pub fn load(cli_root: Option<&str>) -> Result<Self> {
        let file = read_config_file().unwrap_or_default();

        let root_folder = resolve_root_folder(cli_root, file.root_folder.as_deref());

        let notify_retry = RetryPolicy::new(
            file.notify_max_attempts.unwrap_or(3),
            Duration::from_secs(file.notify_backoff_secs.unwrap_or(1)),
        );

        Ok(Self {
            root_folder,
            bind_address: file
                .bind_address
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            functions_base_url: file
                .functions_base_url
                .unwrap_or_else(|| "http://127.0.0.1:9000/functions".to_string()),
            event_capacity: file.event_capacity.unwrap_or(256),
            notify_retry,
        })
    }

    /// Database path inside the root folder
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join("avnu.db")
    }

    /// Create the root folder when missing
    pub fn ensure_root_folder(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }
}

fn resolve_root_folder(cli_arg: Option<&str>, file_value: Option<&str>) -> PathBuf {
    // Priority 1: command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: environment variable
    if let Ok(path) = std::env::var("AVNU_ROOT") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = file_value {
        return PathBuf::from(path);
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("avnu"))
        .unwrap_or_else(|| PathBuf::from("./avnu_data"))
}

fn read_config_file() -> Result<ConfigFile> {
    let path = dirs::config_dir()
        .map(|d| d.join("avnu").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
    if !path.exists() {
        return Err(Error::Config(format!("Config file not found: {path:?}")));
    }
    let content = std::fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("{path:?}: {e}")))
}
