//! Configuration handling for avatar-chat.
//!
//! Secrets come from the environment (a `.env` file in the working directory is
//! loaded first and never overrides variables that are already set). Optional
//! tunables can additionally be provided by `~/.config/avatar-chat/config.toml`
//! or a custom path; environment variables win over the file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Environment variable holding the Groq API key.
pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";
/// Environment variable holding the Tavus API key.
pub const TAVUS_API_KEY_ENV: &str = "TAVUS_API_KEY";
/// Environment variable holding the Tavus replica (avatar) identifier.
pub const TAVUS_REPLICA_ID_ENV: &str = "TAVUS_REPLICA_ID";

pub const TAVUS_BASE_URL_ENV: &str = "TAVUS_BASE_URL";
pub const TAVUS_REQUEST_TIMEOUT_ENV: &str = "TAVUS_REQUEST_TIMEOUT_SECS";
pub const TAVUS_POLL_INTERVAL_ENV: &str = "TAVUS_POLL_INTERVAL_SECS";
pub const TAVUS_MAX_WAIT_ENV: &str = "TAVUS_MAX_WAIT_SECS";
pub const GROQ_BASE_URL_ENV: &str = "GROQ_BASE_URL";
pub const GROQ_MODEL_ENV: &str = "GROQ_MODEL";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Default base URL for the Tavus API.
pub const TAVUS_API_BASE_URL: &str = "https://tavusapi.com";

/// Default base URL for Groq's OpenAI-compatible API.
pub const GROQ_API_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.3-70b-versatile";

/// Default timeout for a single Tavus HTTP request (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default delay between two status polls (10 seconds).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default upper bound on the total time spent waiting for a video (20 minutes).
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(20 * 60);

/// Default timeout for a chat completion request (60 seconds).
pub const DEFAULT_CHAT_TIMEOUT: Duration = Duration::from_secs(60);

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Contents written by `avatar-chat config init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# avatar-chat configuration.
# Secrets (GROQ_API_KEY, TAVUS_API_KEY, TAVUS_REPLICA_ID) are read from the
# environment or a .env file, never from this file.
log_level = "info"

[tavus]
base_url = "https://tavusapi.com"
request_timeout_secs = 30
poll_interval_secs = 10
max_wait_secs = 1200

[chat]
base_url = "https://api.groq.com/openai/v1"
model = "llama-3.3-70b-versatile"
request_timeout_secs = 60
"#;

/// Fully resolved application configuration.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub chat: ChatConfig,
    pub tavus: TavusConfig,
    pub log_level: String,
}

/// Settings for the Tavus video service.
#[derive(Clone)]
pub struct TavusConfig {
    pub api_key: String,
    pub replica_id: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

/// Settings for the chat completion endpoint.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub base_url: String,
    pub model: String,
    pub request_timeout: Duration,
}

impl TavusConfig {
    /// Create a Tavus configuration with default endpoint and timings.
    pub fn new(api_key: impl Into<String>, replica_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            replica_id: replica_id.into(),
            base_url: TAVUS_API_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }

    /// Collection endpoint used to create videos; a job's status lives below it.
    pub fn videos_url(&self) -> String {
        format!("{}/v2/videos", self.base_url.trim_end_matches('/'))
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: GROQ_API_BASE_URL.to_string(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            request_timeout: DEFAULT_CHAT_TIMEOUT,
        }
    }
}

// Secrets must never end up in logs.
impl fmt::Debug for TavusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TavusConfig")
            .field("api_key", &"<redacted>")
            .field("replica_id", &self.replica_id)
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("max_wait", &self.max_wait)
            .finish()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("groq_api_key", &"<redacted>")
            .field("chat", &self.chat)
            .field("tavus", &self.tavus)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Optional settings read from the TOML config file.
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub tavus: TavusFileConfig,
    #[serde(default)]
    pub chat: ChatFileConfig,
    #[serde(default)]
    pub log_level: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct TavusFileConfig {
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub poll_interval_secs: Option<u64>,
    pub max_wait_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ChatFileConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Load the config file at `path` (or the default location).
    /// Returns defaults if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse { path, source: e })
    }
}

impl Config {
    /// Load `.env`, the optional config file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        // Err only means there is no .env file, which is fine
        let _ = dotenv::dotenv();

        let file = FileConfig::load(path)?;
        Self::resolve(file, |name| std::env::var(name).ok())
    }

    /// Resolve a configuration from file settings and a variable lookup.
    ///
    /// Every required variable is checked before failing so the error lists
    /// all missing names at once.
    pub fn resolve<F>(file: FileConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let groq_api_key = non_empty(GROQ_API_KEY_ENV);
        let tavus_api_key = non_empty(TAVUS_API_KEY_ENV);
        let replica_id = non_empty(TAVUS_REPLICA_ID_ENV);

        let missing: Vec<&'static str> = [
            (GROQ_API_KEY_ENV, groq_api_key.is_none()),
            (TAVUS_API_KEY_ENV, tavus_api_key.is_none()),
            (TAVUS_REPLICA_ID_ENV, replica_id.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(groq_api_key), Some(tavus_api_key), Some(replica_id)) =
            (groq_api_key, tavus_api_key, replica_id)
        else {
            return Err(ConfigError::MissingVars(missing));
        };

        let seconds = |env_name: &str, file_value: Option<u64>, default: Duration| {
            match non_empty(env_name) {
                Some(raw) => parse_seconds(env_name, &raw),
                None => match file_value {
                    Some(0) => Err(ConfigError::InvalidValue {
                        name: env_name.to_string(),
                        value: "0".to_string(),
                    }),
                    Some(secs) => Ok(Duration::from_secs(secs)),
                    None => Ok(default),
                },
            }
        };

        let tavus = TavusConfig {
            api_key: tavus_api_key,
            replica_id,
            base_url: non_empty(TAVUS_BASE_URL_ENV)
                .or(file.tavus.base_url)
                .unwrap_or_else(|| TAVUS_API_BASE_URL.to_string()),
            request_timeout: seconds(
                TAVUS_REQUEST_TIMEOUT_ENV,
                file.tavus.request_timeout_secs,
                DEFAULT_REQUEST_TIMEOUT,
            )?,
            poll_interval: seconds(
                TAVUS_POLL_INTERVAL_ENV,
                file.tavus.poll_interval_secs,
                DEFAULT_POLL_INTERVAL,
            )?,
            max_wait: seconds(TAVUS_MAX_WAIT_ENV, file.tavus.max_wait_secs, DEFAULT_MAX_WAIT)?,
        };

        let chat = ChatConfig {
            base_url: non_empty(GROQ_BASE_URL_ENV)
                .or(file.chat.base_url)
                .unwrap_or_else(|| GROQ_API_BASE_URL.to_string()),
            model: non_empty(GROQ_MODEL_ENV)
                .or(file.chat.model)
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            request_timeout: match file.chat.request_timeout_secs {
                Some(0) => {
                    return Err(ConfigError::InvalidValue {
                        name: "chat.request_timeout_secs".to_string(),
                        value: "0".to_string(),
                    })
                }
                Some(secs) => Duration::from_secs(secs),
                None => DEFAULT_CHAT_TIMEOUT,
            },
        };

        let log_level = non_empty(LOG_LEVEL_ENV)
            .or(file.log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            groq_api_key,
            chat,
            tavus,
            log_level,
        })
    }
}

fn parse_seconds(name: &str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable(s): {}", .0.join(", "))]
    MissingVars(Vec<&'static str>),

    #[error("invalid value for {name}: '{value}' (expected a positive number of seconds)")]
    InvalidValue { name: String, value: String },

    #[error("Failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("avatar-chat").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/avatar-chat/config.toml")
        })
}
