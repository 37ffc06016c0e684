use crate::error::{ProbeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Upper bound for `workers = 0` auto sizing.
const MAX_AUTO_WORKERS: usize = 100;
/// Upper bound for an explicit `workers` value.
pub const MAX_WORKERS: usize = 10_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub ssl: SslConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum number of connections served at once. `0` sizes the pool from the CPU count.
    pub workers: usize,
    /// Listen backlog; connections beyond the busy workers wait here.
    pub backlog: u32,
    pub max_request_bytes: usize,
    pub handshake_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8443,
            workers: 4,
            backlog: 1024,
            max_request_bytes: 1024,
            handshake_timeout_secs: 5,
            read_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            (num_cpus::get() * 2).clamp(1, MAX_AUTO_WORKERS)
        } else {
            self.workers
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub enabled: bool,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
}

/// Certificate chain and private key paths, present only when TLS is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

impl SslConfig {
    pub fn tls_files(&self) -> Option<TlsFiles> {
        if !self.enabled {
            return None;
        }
        match (&self.cert_file, &self.key_file) {
            (Some(cert_file), Some(key_file)) => Some(TlsFiles {
                cert_file: cert_file.clone(),
                key_file: key_file.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub data_file: PathBuf,
    pub algorithm: String,
    pub case_sensitive: bool,
    pub reread_on_query: bool,
    /// Let the regex algorithm treat queries as patterns instead of literals.
    pub regex_patterns: bool,
    pub bloom_false_positive_rate: f64,
    pub grep_program: PathBuf,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::new(),
            algorithm: "inmemory".to_string(),
            case_sensitive: false,
            reread_on_query: false,
            regex_patterns: false,
            bloom_false_positive_rate: 0.001,
            grep_program: PathBuf::from("grep"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Loads `path`, or the first config found in the standard locations.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::find_config_path().ok_or_else(|| {
                ProbeError::Config(
                    "no configuration file found (pass --config or create lineprobe.toml)"
                        .to_string(),
                )
            })?,
        };
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ProbeError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
            .map_err(|e| ProbeError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// First existing file among the standard locations.
    pub fn find_config_path() -> Option<PathBuf> {
        if let Some(xdg_config) = dirs::config_dir() {
            let xdg_path = xdg_config.join("lineprobe/config.toml");
            if xdg_path.exists() {
                return Some(xdg_path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let home_path = home.join(".lineprobe.toml");
            if home_path.exists() {
                return Some(home_path);
            }
        }

        let current_path = Path::new("lineprobe.toml");
        if current_path.exists() {
            return Some(current_path.to_path_buf());
        }

        None
    }

    /// Checks everything that can be checked without touching the corpus.
    /// The algorithm name is resolved later by the strategy registry.
    pub fn validate(&self) -> Result<()> {
        if self.search.data_file.as_os_str().is_empty() {
            return Err(ProbeError::Config(
                "required 'search.data_file' is not set".to_string(),
            ));
        }
        if self.search.algorithm.trim().is_empty() {
            return Err(ProbeError::Config(
                "'search.algorithm' must not be empty".to_string(),
            ));
        }
        let rate = self.search.bloom_false_positive_rate;
        if !(rate > 0.0 && rate < 1.0) {
            return Err(ProbeError::Config(format!(
                "'search.bloom_false_positive_rate' must be between 0 and 1, got {rate}"
            )));
        }
        if self.server.host.is_empty() {
            return Err(ProbeError::Config("'server.host' must not be empty".to_string()));
        }
        if self.server.max_request_bytes == 0 {
            return Err(ProbeError::Config(
                "'server.max_request_bytes' must be greater than zero".to_string(),
            ));
        }
        if self.server.workers > MAX_WORKERS {
            return Err(ProbeError::Config(format!(
                "'server.workers' must be at most {MAX_WORKERS}, got {}",
                self.server.workers
            )));
        }
        if self.server.backlog == 0 {
            return Err(ProbeError::Config(
                "'server.backlog' must be greater than zero".to_string(),
            ));
        }

        if self.ssl.enabled {
            let (cert, key) = match (&self.ssl.cert_file, &self.ssl.key_file) {
                (Some(cert), Some(key)) => (cert, key),
                _ => {
                    return Err(ProbeError::Config(
                        "SSL is enabled but cert_file or key_file is missing".to_string(),
                    ))
                }
            };
            if !cert.exists() {
                return Err(ProbeError::Config(format!(
                    "SSL certificate file not found: {}",
                    cert.display()
                )));
            }
            if !key.exists() {
                return Err(ProbeError::Config(format!(
                    "SSL key file not found: {}",
                    key.display()
                )));
            }
        }

        Ok(())
    }
}
