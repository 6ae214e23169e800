use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const CONFIG_FILE_ENV: &str = "LEGAL_CLIENT_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "legal-client.toml";

// Errors raised while assembling the client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid api url {value:?}: {reason}")]
    InvalidUrl { value: String, reason: String },
}

// Optional on-disk overrides; every key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    api_url: Option<String>,
    timeout_ms: Option<u64>,
    session_path: Option<PathBuf>,
}

// Resolved client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: Url,
    pub timeout: Duration,
    pub session_path: PathBuf,
}

impl ClientConfig {
    /// Defaults, then the TOML file, then `LEGAL_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match std::env::var_os(CONFIG_FILE_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|path| path.exists()),
        };
        Self::from_sources(file.as_deref(), |key| std::env::var(key).ok())
    }

    pub fn from_sources(
        file: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let file = match file {
            Some(path) => read_file(path)?,
            None => FileConfig::default(),
        };

        let api_url = env("LEGAL_API_URL")
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let timeout_ms = env("LEGAL_API_TIMEOUT_MS")
            .and_then(|value| value.parse::<u64>().ok())
            .or(file.timeout_ms)
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let session_path = env("LEGAL_SESSION_PATH")
            .map(PathBuf::from)
            .or(file.session_path)
            .unwrap_or_else(default_session_path);

        Ok(Self {
            api_url: parse_api_url(&api_url)?,
            timeout: Duration::from_millis(timeout_ms),
            session_path,
        })
    }
}

// Read and parse the TOML config file.
fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

// Only http and https base URLs are accepted.
fn parse_api_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|err| ConfigError::InvalidUrl {
        value: value.to_string(),
        reason: err.to_string(),
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            value: value.to_string(),
            reason: "expected an http(s) base url".to_string(),
        });
    }
    Ok(url)
}

// Session file under the user config dir, else the working dir.
fn default_session_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("legal-client"))
        .unwrap_or_else(|| PathBuf::from(".legal-client"))
        .join("session.json")
}
