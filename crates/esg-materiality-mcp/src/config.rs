use esg_materiality_core::{InputPolicy, ParsePolicyError};
use esg_materiality_storage::ASSESSMENT_STORAGE_KEY;
use thiserror::Error;

pub const DEFAULT_DB_PATH: &str = "./data/materiality-store.json";
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8788";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Json,
    Memory,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Memory => "memory",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ESG_MATERIALITY_INPUT_POLICY: {0}")]
    InputPolicy(#[from] ParsePolicyError),
    #[error("ESG_MATERIALITY_BACKEND must be json or memory, got {0}")]
    Backend(String),
    #[error("ESG_MATERIALITY_STORAGE_KEY cannot be empty")]
    EmptyStorageKey,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: String,
    pub backend: BackendKind,
    pub storage_key: String,
    pub input_policy: InputPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            backend: BackendKind::Json,
            storage_key: ASSESSMENT_STORAGE_KEY.to_string(),
            input_policy: InputPolicy::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any variable source; unset or blank values fall
    /// back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let backend = match read("ESG_MATERIALITY_BACKEND") {
            None => defaults.backend,
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "json" => BackendKind::Json,
                "memory" => BackendKind::Memory,
                _ => return Err(ConfigError::Backend(raw)),
            },
        };
        let input_policy = match read("ESG_MATERIALITY_INPUT_POLICY") {
            Some(raw) => raw.parse::<InputPolicy>()?,
            None => defaults.input_policy,
        };
        let storage_key = match lookup("ESG_MATERIALITY_STORAGE_KEY") {
            Some(raw) if raw.trim().is_empty() => return Err(ConfigError::EmptyStorageKey),
            Some(raw) => raw.trim().to_string(),
            None => defaults.storage_key,
        };

        Ok(Self {
            db_path: read("ESG_MATERIALITY_DB").unwrap_or(defaults.db_path),
            backend,
            storage_key,
            input_policy,
        })
    }
}
