use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment};
use iris::providers::configs::{OpenAiProviderConfig, ProviderKind};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

// Variable names understood before the IRIS_ prefix existed; IRIS_* takes precedence
const LEGACY_ENV_VARS: &[(&str, &str)] = &[
    ("doubao.api_key", "ARK_API_KEY"),
    ("qwen.api_key", "DASHSCOPE_API_KEY"),
    ("server.port", "PORT"),
    ("server.environment", "NODE_ENV"),
];

/// Load `.env.local` then `.env` from `dir`. Variables that are already set are never
/// overwritten, so `.env.local` wins over `.env` and the real environment wins over both.
pub fn load_env_files(dir: &Path) {
    for name in [".env.local", ".env"] {
        dotenv::from_path(dir.join(name)).ok();
    }
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Directory of a built chat client to serve next to the API
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            static_dir: None,
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderSettings {
    pub host: String,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<i32>,
}

impl ProviderSettings {
    pub fn into_config(self) -> OpenAiProviderConfig {
        OpenAiProviderConfig {
            host: self.host,
            api_key: self.api_key,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub doubao: ProviderSettings,
    pub qwen: ProviderSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        // Start with default configuration
        let mut builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("server.environment", default_environment())?;

        for kind in [ProviderKind::Doubao, ProviderKind::Qwen] {
            builder = builder
                .set_default(format!("{}.host", kind.name()), kind.default_host())?
                .set_default(format!("{}.model", kind.name()), kind.default_model())?;
        }

        for (key, var) in LEGACY_ENV_VARS {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_default(*key, value)?;
            }
        }

        // Layer on the environment variables
        let config = builder
            .add_source(
                Environment::with_prefix("IRIS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Self = config.try_deserialize().map_err(|err| {
            tracing::debug!("Configuration error: {:?}", &err);
            ConfigError::Other(err)
        })?;
        settings.validate()
    }

    // Both upstream credentials are required to serve traffic
    fn validate(self) -> Result<Self, ConfigError> {
        for (key, provider) in [("doubao.api_key", &self.doubao), ("qwen.api_key", &self.qwen)] {
            if provider.api_key.trim().is_empty() {
                return Err(ConfigError::MissingEnvVar {
                    env_var: to_env_var(key),
                });
            }
        }
        Ok(self)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_environment() -> String {
    "development".to_string()
}
