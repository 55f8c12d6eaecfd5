//! Typed view of the merged configuration layer.
//!
//! Fields that every deployment must author are `Option`s with no default:
//! reading one that is absent yields [`ConfigError::MissingRequiredKey`].
//! Fields with a documented default use serde defaults so a missing key or a
//! missing section both fall back to the same value.

use super::env::{Converter, ENV_MAPPINGS};
use super::layer::{ConfigLayer, ConfigValue};
use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Default image generation timeout in seconds.
pub const DEFAULT_IMAGE_TIMEOUT: i64 = 300;
/// Default video generation timeout in seconds.
pub const DEFAULT_VIDEO_TIMEOUT: i64 = 1500;
/// Default cache entry lifetime in seconds.
pub const DEFAULT_CACHE_TIMEOUT: i64 = 7200;

/// All settings, one struct per section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub global: GlobalSettings,

    #[serde(default)]
    pub flow: FlowSettings,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub debug: DebugSettings,

    #[serde(default)]
    pub proxy: ProxySettings,

    #[serde(default)]
    pub generation: GenerationSettings,

    #[serde(default)]
    pub cache: CacheSettings,
}

/// `[global]` credentials. All required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub admin_username: Option<String>,

    #[serde(default)]
    pub admin_password: Option<String>,
}

/// `[flow]` upstream service settings. All required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowSettings {
    /// Google Labs base URL for project management.
    #[serde(default)]
    pub labs_base_url: Option<String>,

    /// AI Sandbox API base URL for generation.
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Request timeout in seconds.
    #[serde(default)]
    pub timeout: Option<i64>,

    #[serde(default)]
    pub max_retries: Option<i64>,

    /// Seconds between status polls.
    #[serde(default)]
    pub poll_interval: Option<f64>,

    #[serde(default)]
    pub max_poll_attempts: Option<i64>,
}

/// `[server]` listen address. All required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<i64>,
}

/// `[debug]` request/response logging switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugSettings {
    /// Debug mode (default: false).
    #[serde(default)]
    pub enabled: bool,

    /// Log upstream requests (default: true).
    #[serde(default = "default_true")]
    pub log_requests: bool,

    /// Log upstream responses (default: true).
    #[serde(default = "default_true")]
    pub log_responses: bool,

    /// Mask tokens in logs (default: true).
    #[serde(default = "default_true")]
    pub mask_token: bool,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            log_requests: true,
            log_responses: true,
            mask_token: true,
        }
    }
}

/// `[proxy]` outbound proxy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxySettings {
    #[serde(default)]
    pub proxy_enabled: bool,

    #[serde(default)]
    pub proxy_url: Option<String>,
}

/// `[generation]` timeouts in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default = "default_image_timeout")]
    pub image_timeout: i64,

    #[serde(default = "default_video_timeout")]
    pub video_timeout: i64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            image_timeout: default_image_timeout(),
            video_timeout: default_video_timeout(),
        }
    }
}

/// `[cache]` generated-file cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default)]
    pub enabled: bool,

    /// Lifetime in seconds (default: 7200).
    #[serde(default = "default_cache_timeout")]
    pub timeout: i64,

    /// Public base URL for cached files (default: empty, meaning the server's own).
    #[serde(default)]
    pub base_url: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout: default_cache_timeout(),
            base_url: String::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_image_timeout() -> i64 {
    DEFAULT_IMAGE_TIMEOUT
}

fn default_video_timeout() -> i64 {
    DEFAULT_VIDEO_TIMEOUT
}

fn default_cache_timeout() -> i64 {
    DEFAULT_CACHE_TIMEOUT
}

fn required<T: Clone>(
    value: &Option<T>,
    section: &'static str,
    key: &'static str,
) -> ConfigResult<T> {
    value
        .clone()
        .ok_or_else(|| ConfigError::missing(section, key))
}

impl Settings {
    /// Decode the merged layer.
    ///
    /// Fails if a known key holds a value of the wrong type. Unknown sections
    /// and keys are ignored.
    pub fn from_layer(layer: &ConfigLayer) -> ConfigResult<Self> {
        check_types(layer)?;
        Ok(serde_json::from_value(layer.to_json())?)
    }

    pub fn api_key(&self) -> ConfigResult<String> {
        required(&self.global.api_key, "global", "api_key")
    }

    pub fn admin_username(&self) -> ConfigResult<String> {
        required(&self.global.admin_username, "global", "admin_username")
    }

    pub fn admin_password(&self) -> ConfigResult<String> {
        required(&self.global.admin_password, "global", "admin_password")
    }

    pub fn flow_labs_base_url(&self) -> ConfigResult<String> {
        required(&self.flow.labs_base_url, "flow", "labs_base_url")
    }

    pub fn flow_api_base_url(&self) -> ConfigResult<String> {
        required(&self.flow.api_base_url, "flow", "api_base_url")
    }

    pub fn flow_timeout(&self) -> ConfigResult<i64> {
        required(&self.flow.timeout, "flow", "timeout")
    }

    pub fn flow_max_retries(&self) -> ConfigResult<i64> {
        required(&self.flow.max_retries, "flow", "max_retries")
    }

    pub fn poll_interval(&self) -> ConfigResult<f64> {
        required(&self.flow.poll_interval, "flow", "poll_interval")
    }

    pub fn max_poll_attempts(&self) -> ConfigResult<i64> {
        required(&self.flow.max_poll_attempts, "flow", "max_poll_attempts")
    }

    pub fn server_host(&self) -> ConfigResult<String> {
        required(&self.server.host, "server", "host")
    }

    pub fn server_port(&self) -> ConfigResult<i64> {
        required(&self.server.port, "server", "port")
    }
}

/// Check every known key against the type its environment converter produces.
///
/// The mapping table covers every typed field, so it doubles as the schema.
fn check_types(layer: &ConfigLayer) -> ConfigResult<()> {
    for entry in ENV_MAPPINGS {
        let Some(value) = layer.get(entry.section, entry.key) else {
            continue;
        };
        let ok = match entry.converter {
            Converter::String => matches!(value, ConfigValue::String(_)),
            Converter::Integer => matches!(value, ConfigValue::Integer(_)),
            Converter::Float => matches!(value, ConfigValue::Float(_) | ConfigValue::Integer(_)),
            Converter::Boolean => matches!(value, ConfigValue::Boolean(_)),
        };
        if !ok {
            return Err(ConfigError::InvalidType {
                message: format!(
                    "{}.{} must be {}, found {} {}",
                    entry.section,
                    entry.key,
                    expected_name(entry.converter),
                    value.type_name(),
                    value
                ),
            });
        }
    }
    Ok(())
}

fn expected_name(converter: Converter) -> &'static str {
    match converter {
        Converter::String => "a string",
        Converter::Integer => "an integer",
        Converter::Float => "a number",
        Converter::Boolean => "a boolean",
    }
}
