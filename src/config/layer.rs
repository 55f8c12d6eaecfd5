//! Configuration layers: section -> key -> typed scalar.
//!
//! The file layer is parsed from TOML and keeps the types the file gave it.
//! Environment overrides are merged on top (see [`super::merge`]) and the
//! result is the single merged layer that backs every accessor.

use crate::error::{ConfigError, ConfigResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl ConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to floats; TOML writes `poll_interval = 2` without a dot.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(f) => Some(*f),
            ConfigValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::String(_) => "string",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::Boolean(_) => "boolean",
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::String(s) => write!(f, "{}", s),
            ConfigValue::Integer(i) => write!(f, "{}", i),
            ConfigValue::Float(v) => write!(f, "{}", v),
            ConfigValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Boolean(value)
    }
}

/// Keys and values of one section.
pub type Section = BTreeMap<String, ConfigValue>;

/// Mapping from section name to the keys in that section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConfigLayer(BTreeMap<String, Section>);

impl ConfigLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&ConfigValue> {
        self.0.get(section).and_then(|s| s.get(key))
    }

    pub fn section(&self, section: &str) -> Option<&Section> {
        self.0.get(section)
    }

    pub fn contains(&self, section: &str, key: &str) -> bool {
        self.get(section, key).is_some()
    }

    /// Set a value, creating the section if it does not exist yet.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<ConfigValue>) {
        self.0
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Insert an empty section if absent.
    pub fn ensure_section(&mut self, section: &str) -> &mut Section {
        self.0.entry(section.to_string()).or_default()
    }

    pub fn sections(&self) -> impl Iterator<Item = (&String, &Section)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of section/key pairs.
    pub fn len(&self) -> usize {
        self.0.values().map(|s| s.len()).sum()
    }

    pub(crate) fn into_inner(self) -> BTreeMap<String, Section> {
        self.0
    }

    pub(crate) fn inner_mut(&mut self) -> &mut BTreeMap<String, Section> {
        &mut self.0
    }

    /// Convert to a JSON object for typed decoding and diagnostics.
    pub fn to_json(&self) -> serde_json::Value {
        let sections = self
            .0
            .iter()
            .map(|(name, keys)| {
                let keys = keys
                    .iter()
                    .map(|(k, v)| (k.clone(), value_to_json(v)))
                    .collect();
                (name.clone(), serde_json::Value::Object(keys))
            })
            .collect();
        serde_json::Value::Object(sections)
    }
}

fn value_to_json(value: &ConfigValue) -> serde_json::Value {
    match value {
        ConfigValue::String(s) => serde_json::Value::String(s.clone()),
        ConfigValue::Integer(i) => serde_json::Value::from(*i),
        // Non-finite floats are rejected by the loader and the env converters.
        ConfigValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ConfigValue::Boolean(b) => serde_json::Value::Bool(*b),
    }
}

/// Read and parse the config file at `path`.
pub fn load_layer(path: &Path) -> ConfigResult<ConfigLayer> {
    debug!("Reading config file: {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_layer(&contents, path)
}

/// Parse TOML contents into a layer. `origin` is used in error messages.
pub fn parse_layer(contents: &str, origin: &Path) -> ConfigResult<ConfigLayer> {
    let table: toml::Table = toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: origin.to_path_buf(),
        source,
    })?;

    let structure = |message: String| ConfigError::Structure {
        path: origin.to_path_buf(),
        message,
    };

    let mut layer = ConfigLayer::new();
    for (section_name, section_value) in table {
        let entries = match section_value {
            toml::Value::Table(entries) => entries,
            other => {
                return Err(structure(format!(
                    "top-level key '{}' must be a section, found {}",
                    section_name,
                    other.type_str()
                )));
            }
        };

        let section = layer.ensure_section(&section_name);
        for (key, value) in entries {
            let value = match value {
                toml::Value::String(s) => ConfigValue::String(s),
                toml::Value::Integer(i) => ConfigValue::Integer(i),
                toml::Value::Float(f) if f.is_finite() => ConfigValue::Float(f),
                toml::Value::Float(f) => {
                    return Err(structure(format!(
                        "{}.{} must be a finite number, found {}",
                        section_name, key, f
                    )));
                }
                toml::Value::Boolean(b) => ConfigValue::Boolean(b),
                other => {
                    return Err(structure(format!(
                        "{}.{} must be a string, integer, float or boolean, found {}",
                        section_name,
                        key,
                        other.type_str()
                    )));
                }
            };
            section.insert(key, value);
        }
    }

    Ok(layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn origin() -> PathBuf {
        PathBuf::from("setting.toml")
    }

    #[test]
    fn test_parse_keeps_native_types() {
        let layer = parse_layer(
            r#"
[flow]
labs_base_url = "https://labs.example"
timeout = 120
poll_interval = 3.5

[debug]
enabled = true
"#,
            &origin(),
        )
        .unwrap();

        assert_eq!(
            layer.get("flow", "labs_base_url"),
            Some(&ConfigValue::from("https://labs.example"))
        );
        assert_eq!(layer.get("flow", "timeout"), Some(&ConfigValue::Integer(120)));
        assert_eq!(layer.get("flow", "poll_interval"), Some(&ConfigValue::Float(3.5)));
        assert_eq!(layer.get("debug", "enabled"), Some(&ConfigValue::Boolean(true)));
        assert_eq!(layer.len(), 4);
    }

    #[test]
    fn test_string_numbers_are_not_coerced() {
        let layer = parse_layer("[server]\nport = \"8000\"\n", &origin()).unwrap();
        assert_eq!(layer.get("server", "port"), Some(&ConfigValue::from("8000")));
    }

    #[test]
    fn test_empty_section_is_kept() {
        let layer = parse_layer("[cache]\n", &origin()).unwrap();
        assert!(layer.section("cache").is_some());
        assert!(!layer.contains("cache", "enabled"));
    }

    #[test]
    fn test_top_level_scalar_rejected() {
        let err = parse_layer("api_key = \"x\"\n", &origin()).unwrap_err();
        assert!(matches!(err, ConfigError::Structure { .. }));
    }

    #[test]
    fn test_array_value_rejected() {
        let err = parse_layer("[flow]\nhosts = [\"a\", \"b\"]\n", &origin()).unwrap_err();
        assert!(matches!(err, ConfigError::Structure { .. }));
        assert!(err.to_string().contains("flow.hosts"));
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let err = parse_layer("[flow]\npoll_interval = nan\n", &origin()).unwrap_err();
        assert!(matches!(err, ConfigError::Structure { .. }));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = parse_layer("[flow\ntimeout = 1", &origin()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = load_layer(&temp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("setting.toml");
        std::fs::write(&path, "[server]\nhost = \"0.0.0.0\"\nport = 8000\n").unwrap();

        let layer = load_layer(&path).unwrap();
        assert_eq!(layer.get("server", "port").and_then(|v| v.as_i64()), Some(8000));
    }

    #[test]
    fn test_set_creates_section() {
        let mut layer = ConfigLayer::new();
        layer.set("cache", "enabled", true);
        assert_eq!(layer.get("cache", "enabled"), Some(&ConfigValue::Boolean(true)));
    }

    #[test]
    fn test_integer_widens_to_float() {
        assert_eq!(ConfigValue::Integer(2).as_f64(), Some(2.0));
        assert_eq!(ConfigValue::Float(2.0).as_i64(), None);
    }

    #[test]
    fn test_to_json() {
        let mut layer = ConfigLayer::new();
        layer.set("flow", "timeout", 120i64);
        layer.set("flow", "poll_interval", 3.0);
        assert_eq!(
            layer.to_json(),
            serde_json::json!({"flow": {"timeout": 120, "poll_interval": 3.0}})
        );
    }
}
