use crate::error::{DashError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file name, looked up in the project root.
pub const CONFIG_FILE: &str = "devdash.yaml";

/// Environment variable that overrides `store.database_url`.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    File,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// JSON document for the file backend, relative to the project root.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/projects.json")
}

fn default_store_timeout() -> u64 {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            path: default_store_path(),
            database_url: None,
            timeout_secs: default_store_timeout(),
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn resolved_path(&self, root: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            root.join(&self.path)
        }
    }

    /// `DATABASE_URL` wins over the file value.
    pub fn database_url(&self) -> Option<String> {
        std::env::var(DATABASE_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.database_url.clone())
    }
}

// ---------------------------------------------------------------------------
// AiConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_ai_timeout() -> u64 {
    60
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key_env: default_api_key_env(),
            base_url: None,
            timeout_secs: default_ai_timeout(),
        }
    }
}

impl AiConfig {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// BuildConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// argv of the build command, run in the project root.
    #[serde(default = "default_build_command")]
    pub command: Vec<String>,
    #[serde(default = "default_build_timeout")]
    pub timeout_secs: u64,
}

fn default_build_command() -> Vec<String> {
    vec!["npm".into(), "run".into(), "build".into()]
}

fn default_build_timeout() -> u64 {
    300
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: default_build_command(),
            timeout_secs: default_build_timeout(),
        }
    }
}

impl BuildConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// SyncConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    1000
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl SyncConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Config {
    pub fn path(root: &Path) -> PathBuf {
        root.join(CONFIG_FILE)
    }

    /// Load `devdash.yaml` from `root`. A missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)
            .map_err(|e| DashError::Config(format!("{}: {e}", path.display())))?;
        Ok(cfg)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.store.backend == StoreBackend::Postgres && self.store.database_url().is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "store.backend is postgres but neither store.database_url nor {DATABASE_URL_ENV} is set"
                ),
            });
        }

        if self.ai.api_key().is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "{} is not set; AI chat and decomposition are unavailable",
                    self.ai.api_key_env
                ),
            });
        }

        if self.build.command.is_empty() || self.build.command[0].trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "build.command is empty".to_string(),
            });
        }

        if self.sync.debounce_ms == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "sync.debounce_ms = 0 disables write coalescing".to_string(),
            });
        }

        for (name, secs) in [
            ("store.timeout_secs", self.store.timeout_secs),
            ("ai.timeout_secs", self.ai.timeout_secs),
            ("build.timeout_secs", self.build.timeout_secs),
        ] {
            if secs == 0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("{name} must be greater than 0"),
                });
            }
        }

        warnings
    }
}
