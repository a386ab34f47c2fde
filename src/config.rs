//! Service configuration.
//!
//! Everything the service needs is read once at startup into a
//! [`ServiceConfig`] and passed by reference from there on. Sources are
//! merged in this order (later wins):
//!
//! 1. Built-in defaults
//! 2. `./evaluator.toml` if present, or the file given with `--config`
//! 3. Plain environment variables (`PORT`, `GROQ_API_KEY`, `GROQ_MODEL`)
//! 4. `EVALUATOR_*` environment variables
//! 5. CLI overrides

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_FIELD_CHARS: usize = 1500;

const PROJECT_CONFIG_FILE: &str = "evaluator.toml";
const ENV_PREFIX: &str = "EVALUATOR_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing upstream API key: set GROQ_API_KEY or EVALUATOR_API_KEY")]
    MissingApiKey,

    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Configuration as it comes out of the merged sources, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,
    pub max_field_chars: usize,
    pub log_file: Option<PathBuf>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            max_field_chars: DEFAULT_MAX_FIELD_CHARS,
            log_file: None,
        }
    }
}

/// Validated configuration. Holding one means the upstream credential is
/// present.
#[derive(Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub body_limit_bytes: usize,
    pub max_field_chars: usize,
    pub log_file: Option<PathBuf>,
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Full URL of the chat completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

// Keeps the credential out of logs.
impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("body_limit_bytes", &self.body_limit_bytes)
            .field("max_field_chars", &self.max_field_chars)
            .field("log_file", &self.log_file)
            .finish()
    }
}

impl TryFrom<RawConfig> for ServiceConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let api_key = raw
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        if raw.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "model",
                reason: "must not be empty".to_string(),
            });
        }
        if raw.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if raw.max_field_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_field_chars",
                reason: "must be greater than zero".to_string(),
            });
        }
        if !raw.base_url.starts_with("http://") && !raw.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "base_url",
                reason: format!("`{}` is not an http(s) URL", raw.base_url),
            });
        }

        Ok(Self {
            host: raw.host,
            port: raw.port,
            api_key,
            model: raw.model,
            base_url: raw.base_url,
            request_timeout: Duration::from_secs(raw.request_timeout_secs),
            body_limit_bytes: raw.body_limit_bytes,
            max_field_chars: raw.max_field_chars,
            log_file: raw.log_file,
        })
    }
}

/// Overrides taken from the command line.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub port: Option<u16>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Merge every source into a [`Figment`] without extracting it.
    pub fn figment(overrides: &CliOverrides) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(RawConfig::default()));

        match &overrides.config_path {
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => {
                let path = Path::new(PROJECT_CONFIG_FILE);
                if path.exists() {
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        figment = figment
            .merge(Env::raw().filter_map(|key| {
                match key.as_str().to_ascii_uppercase().as_str() {
                    "PORT" => Some("port".into()),
                    "GROQ_API_KEY" => Some("api_key".into()),
                    "GROQ_MODEL" => Some("model".into()),
                    _ => None,
                }
            }))
            .merge(Env::prefixed(ENV_PREFIX));

        if let Some(port) = overrides.port {
            figment = figment.merge(("port", port));
        }

        figment
    }

    /// Load and validate. Fails when the credential is absent.
    pub fn load(overrides: &CliOverrides) -> Result<ServiceConfig, ConfigError> {
        let raw: RawConfig = Self::figment(overrides).extract().map_err(Box::new)?;
        ServiceConfig::try_from(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::io::Write;

    fn raw_with_key() -> RawConfig {
        RawConfig {
            api_key: Some("gsk_test".to_string()),
            ..RawConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::try_from(raw_with_key()).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.body_limit_bytes, 10 * 1024 * 1024);
        assert_eq!(config.max_field_chars, 1500);
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let err = ServiceConfig::try_from(RawConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn test_blank_api_key_is_rejected() {
        let raw = RawConfig {
            api_key: Some("   ".to_string()),
            ..RawConfig::default()
        };
        assert!(matches!(
            ServiceConfig::try_from(raw),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let raw = RawConfig {
            request_timeout_secs: 0,
            ..raw_with_key()
        };
        assert!(matches!(
            ServiceConfig::try_from(raw),
            Err(ConfigError::InvalidValue {
                field: "request_timeout_secs",
                ..
            })
        ));
    }

    #[test]
    fn test_non_http_base_url_is_rejected() {
        let raw = RawConfig {
            base_url: "ftp://example.com".to_string(),
            ..raw_with_key()
        };
        assert!(matches!(
            ServiceConfig::try_from(raw),
            Err(ConfigError::InvalidValue {
                field: "base_url",
                ..
            })
        ));
    }

    #[test]
    fn test_completions_url_strips_trailing_slash() {
        let raw = RawConfig {
            base_url: "http://127.0.0.1:9000/v1/".to_string(),
            ..raw_with_key()
        };
        let config = ServiceConfig::try_from(raw).unwrap();
        assert_eq!(
            config.completions_url(),
            "http://127.0.0.1:9000/v1/chat/completions"
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ServiceConfig::try_from(raw_with_key()).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("gsk_test"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_load_from_environment() {
        Jail::expect_with(|jail| {
            jail.set_env("GROQ_API_KEY", "gsk_env");
            jail.set_env("PORT", "8080");
            jail.set_env("EVALUATOR_MODEL", "mixtral-8x7b");

            let config =
                ConfigLoader::load(&CliOverrides::default()).map_err(|e| e.to_string())?;
            assert_eq!(config.api_key, "gsk_env");
            assert_eq!(config.port, 8080);
            assert_eq!(config.model, "mixtral-8x7b");
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_env_overrides_plain_env() {
        Jail::expect_with(|jail| {
            jail.set_env("GROQ_API_KEY", "gsk_plain");
            jail.set_env("EVALUATOR_API_KEY", "gsk_prefixed");

            let config =
                ConfigLoader::load(&CliOverrides::default()).map_err(|e| e.to_string())?;
            assert_eq!(config.api_key, "gsk_prefixed");
            Ok(())
        });
    }

    #[test]
    fn test_project_file_is_picked_up() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "evaluator.toml",
                r#"
                    api_key = "gsk_file"
                    request_timeout_secs = 5
                    max_field_chars = 200
                "#,
            )?;

            let config =
                ConfigLoader::load(&CliOverrides::default()).map_err(|e| e.to_string())?;
            assert_eq!(config.api_key, "gsk_file");
            assert_eq!(config.request_timeout, Duration::from_secs(5));
            assert_eq!(config.max_field_chars, 200);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_path_and_cli_port_override() {
        Jail::expect_with(|jail| {
            jail.set_env("PORT", "7000");

            let mut file = tempfile::NamedTempFile::new().map_err(|e| e.to_string())?;
            writeln!(file, "api_key = \"gsk_tmp\"\nport = 6000").map_err(|e| e.to_string())?;

            let overrides = CliOverrides {
                config_path: Some(file.path().to_path_buf()),
                port: Some(9999),
            };
            let config = ConfigLoader::load(&overrides).map_err(|e| e.to_string())?;
            assert_eq!(config.api_key, "gsk_tmp");
            assert_eq!(config.port, 9999);
            Ok(())
        });
    }
}
