//! Environment-variable overrides.
//!
//! A fixed table maps each recognized `FLOW2API_*` variable to one
//! section/key and a converter. The table is the only place that decides which
//! variables are read and how each is typed; it never depends on file contents.

use super::layer::{ConfigLayer, ConfigValue};
use super::merge::merge_layers;
use crate::error::ConvertError;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// How a raw environment string becomes a typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Converter {
    String,
    Integer,
    Float,
    Boolean,
}

/// Tokens accepted as `true` by the boolean converter (compared case-insensitively).
pub const TRUTHY_TOKENS: &[&str] = &["true", "1", "yes", "on", "enabled"];

impl Converter {
    /// Convert a raw value. Only the numeric converters can fail.
    pub fn convert(self, raw: &str) -> Result<ConfigValue, String> {
        match self {
            Converter::String => Ok(ConfigValue::String(raw.to_string())),
            Converter::Integer => parse_integer(raw).map(ConfigValue::Integer),
            Converter::Float => parse_float(raw).map(ConfigValue::Float),
            Converter::Boolean => Ok(ConfigValue::Boolean(parse_bool(raw))),
        }
    }
}

/// Base-10 integer; surrounding whitespace is ignored.
pub fn parse_integer(raw: &str) -> Result<i64, String> {
    raw.trim()
        .parse::<i64>()
        .map_err(|e| format!("expected an integer: {}", e))
}

/// Floating-point literal; must be finite.
pub fn parse_float(raw: &str) -> Result<f64, String> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("expected a number: {}", e))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err("expected a finite number".to_string())
    }
}

/// Lenient boolean: anything outside [`TRUTHY_TOKENS`] is `false`.
pub fn parse_bool(raw: &str) -> bool {
    TRUTHY_TOKENS
        .iter()
        .any(|token| raw.eq_ignore_ascii_case(token))
}

/// One recognized environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnvMapping {
    pub var: &'static str,
    pub section: &'static str,
    pub key: &'static str,
    pub converter: Converter,
}

const fn mapping(
    var: &'static str,
    section: &'static str,
    key: &'static str,
    converter: Converter,
) -> EnvMapping {
    EnvMapping {
        var,
        section,
        key,
        converter,
    }
}

/// Every environment variable the resolver recognizes.
pub static ENV_MAPPINGS: &[EnvMapping] = &[
    // Global
    mapping("FLOW2API_API_KEY", "global", "api_key", Converter::String),
    mapping("FLOW2API_ADMIN_USERNAME", "global", "admin_username", Converter::String),
    mapping("FLOW2API_ADMIN_PASSWORD", "global", "admin_password", Converter::String),
    // Flow
    mapping("FLOW2API_LABS_BASE_URL", "flow", "labs_base_url", Converter::String),
    mapping("FLOW2API_API_BASE_URL", "flow", "api_base_url", Converter::String),
    mapping("FLOW2API_TIMEOUT", "flow", "timeout", Converter::Integer),
    mapping("FLOW2API_MAX_RETRIES", "flow", "max_retries", Converter::Integer),
    mapping("FLOW2API_POLL_INTERVAL", "flow", "poll_interval", Converter::Float),
    mapping("FLOW2API_MAX_POLL_ATTEMPTS", "flow", "max_poll_attempts", Converter::Integer),
    // Server
    mapping("FLOW2API_HOST", "server", "host", Converter::String),
    mapping("FLOW2API_PORT", "server", "port", Converter::Integer),
    // Debug
    mapping("FLOW2API_DEBUG_ENABLED", "debug", "enabled", Converter::Boolean),
    mapping("FLOW2API_DEBUG_LOG_REQUESTS", "debug", "log_requests", Converter::Boolean),
    mapping("FLOW2API_DEBUG_LOG_RESPONSES", "debug", "log_responses", Converter::Boolean),
    mapping("FLOW2API_DEBUG_MASK_TOKEN", "debug", "mask_token", Converter::Boolean),
    // Proxy
    mapping("FLOW2API_PROXY_ENABLED", "proxy", "proxy_enabled", Converter::Boolean),
    mapping("FLOW2API_PROXY_URL", "proxy", "proxy_url", Converter::String),
    // Generation
    mapping("FLOW2API_IMAGE_TIMEOUT", "generation", "image_timeout", Converter::Integer),
    mapping("FLOW2API_VIDEO_TIMEOUT", "generation", "video_timeout", Converter::Integer),
    // Cache
    mapping("FLOW2API_CACHE_ENABLED", "cache", "enabled", Converter::Boolean),
    mapping("FLOW2API_CACHE_TIMEOUT", "cache", "timeout", Converter::Integer),
    mapping("FLOW2API_CACHE_BASE_URL", "cache", "base_url", Converter::String),
];

/// Find the table entry for a variable name.
pub fn find_mapping(var: &str) -> Option<&'static EnvMapping> {
    ENV_MAPPINGS.iter().find(|m| m.var == var)
}

/// Source of environment variables.
pub trait EnvSource: Send + Sync {
    /// Value of `name`, or `None` if unset. Non-unicode values count as unset.
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Result of applying environment overrides.
#[derive(Debug, Clone)]
pub struct EnvOverrideOutcome {
    /// The merged layer.
    pub layer: ConfigLayer,
    /// Variables that were present and applied.
    pub applied: Vec<&'static str>,
    /// Variables that were present but failed conversion (skipped).
    pub skipped: Vec<ConvertError>,
}

/// Apply environment overrides onto `layer`.
///
/// A variable that fails conversion is skipped with a warning and its key
/// keeps the prior value; loading never fails here.
pub fn apply_env_overrides(
    layer: ConfigLayer,
    table: &'static [EnvMapping],
    env: &dyn EnvSource,
) -> ConfigLayer {
    apply_env_overrides_with_report(layer, table, env).layer
}

/// Like [`apply_env_overrides`], also reporting what was applied or skipped.
pub fn apply_env_overrides_with_report(
    layer: ConfigLayer,
    table: &'static [EnvMapping],
    env: &dyn EnvSource,
) -> EnvOverrideOutcome {
    let mut overlay = ConfigLayer::new();
    let mut applied = Vec::new();
    let mut skipped = Vec::new();

    for entry in table {
        let Some(raw) = env.var(entry.var) else {
            continue;
        };

        match entry.converter.convert(&raw) {
            Ok(value) => {
                debug!(
                    var = entry.var,
                    section = entry.section,
                    key = entry.key,
                    "Applying environment override"
                );
                overlay.set(entry.section, entry.key, value);
                applied.push(entry.var);
            }
            Err(reason) => {
                let err = ConvertError {
                    var: entry.var.to_string(),
                    value: raw,
                    reason,
                };
                warn!("Ignoring environment override: {}", err);
                skipped.push(err);
            }
        }
    }

    EnvOverrideOutcome {
        layer: merge_layers(layer, overlay),
        applied,
        skipped,
    }
}

/// One present environment variable and the value it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverrideInfo {
    pub section: String,
    pub key: String,
    pub env_value: String,
    /// Value currently held at section/key in the merged layer.
    pub config_value: Option<ConfigValue>,
}

/// Report the environment variables that are currently set.
///
/// Variables absent from the environment never appear, even when their key
/// has a value from the file.
pub fn describe_overrides(
    table: &'static [EnvMapping],
    env: &dyn EnvSource,
    layer: &ConfigLayer,
) -> BTreeMap<String, OverrideInfo> {
    table
        .iter()
        .filter_map(|entry| {
            let env_value = env.var(entry.var)?;
            let info = OverrideInfo {
                section: entry.section.to_string(),
                key: entry.key.to_string(),
                env_value,
                config_value: layer.get(entry.section, entry.key).cloned(),
            };
            Some((entry.var.to_string(), info))
        })
        .collect()
}
