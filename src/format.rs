//! Output formatting for configuration diagnostics.

use crate::config::{ConfigLayer, ConfigValue, OverrideInfo, find_mapping};
use anyhow::Result;
use clap::ValueEnum;
use std::collections::BTreeMap;

/// Placeholder printed instead of secret values.
pub const MASK: &str = "***";

/// Keys whose values are secrets.
const SECRET_KEYS: &[(&str, &str)] = &[("global", "api_key"), ("global", "admin_password")];

/// Output format for diagnostic dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
    Toml,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            "toml" => Some(OutputFormat::Toml),
            _ => None,
        }
    }
}

pub fn is_secret(section: &str, key: &str) -> bool {
    SECRET_KEYS.iter().any(|(s, k)| *s == section && *k == key)
}

/// Copy of `layer` with secret values replaced by [`MASK`].
pub fn mask_layer(layer: &ConfigLayer) -> ConfigLayer {
    let mut masked = layer.clone();
    for (section, key) in SECRET_KEYS {
        if masked.contains(section, key) {
            masked.set(section, key, MASK);
        }
    }
    masked
}

/// Copy of an override report with secret values replaced by [`MASK`].
pub fn mask_overrides(report: &BTreeMap<String, OverrideInfo>) -> BTreeMap<String, OverrideInfo> {
    report
        .iter()
        .map(|(var, info)| {
            let mut info = info.clone();
            if is_secret(&info.section, &info.key) {
                info.env_value = MASK.to_string();
                if info.config_value.is_some() {
                    info.config_value = Some(ConfigValue::from(MASK));
                }
            }
            (var.clone(), info)
        })
        .collect()
}

/// Render a layer in the requested format.
pub fn format_layer(layer: &ConfigLayer, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => format_layer_text(layer),
        OutputFormat::Json => serde_json::to_string_pretty(layer)?,
        OutputFormat::Yaml => serde_yaml::to_string(layer)?,
        OutputFormat::Toml => toml::to_string_pretty(layer)?,
    })
}

/// Render a layer as TOML-like `[section]` blocks with quoted strings.
pub fn format_layer_text(layer: &ConfigLayer) -> String {
    let mut out = String::new();

    for (name, section) in layer.sections() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("[{}]\n", name));
        for (key, value) in section {
            out.push_str(&format!("{} = {}\n", key, format_value(value)));
        }
    }

    out
}

fn format_value(value: &ConfigValue) -> String {
    match value {
        ConfigValue::String(s) => format!("{:?}", s),
        other => other.to_string(),
    }
}

/// Render an override report in the requested format.
pub fn format_overrides(
    report: &BTreeMap<String, OverrideInfo>,
    format: OutputFormat,
) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => format_overrides_text(report),
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
        OutputFormat::Yaml => serde_yaml::to_string(report)?,
        // TOML has no null, so absent values are dropped by the serializer.
        OutputFormat::Toml => toml::to_string_pretty(report)?,
    })
}

/// One line per variable: name, target, raw value, effective value.
pub fn format_overrides_text(report: &BTreeMap<String, OverrideInfo>) -> String {
    if report.is_empty() {
        return "No FLOW2API_* environment overrides set.\n".to_string();
    }

    let mut out = format!("# Environment overrides ({})\n", report.len());
    for (var, info) in report {
        let effective = match &info.config_value {
            Some(value) => format_value(value),
            None => "(unset)".to_string(),
        };
        let converter = find_mapping(var)
            .map(|m| format!("{:?}", m.converter).to_lowercase())
            .unwrap_or_default();
        out.push_str(&format!(
            "{} -> {}.{} [{}] env={:?} effective={}\n",
            var, info.section, info.key, converter, info.env_value, effective
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_layer() -> ConfigLayer {
        let mut layer = ConfigLayer::new();
        layer.set("global", "api_key", "secret-key");
        layer.set("global", "admin_username", "admin");
        layer.set("server", "port", 8000i64);
        layer
    }

    #[test]
    fn test_parse() {
        assert_eq!(OutputFormat::parse("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("yml"), Some(OutputFormat::Yaml));
        assert_eq!(OutputFormat::parse("xml"), None);
    }

    #[test]
    fn test_mask_layer() {
        let masked = mask_layer(&sample_layer());
        assert_eq!(masked.get("global", "api_key"), Some(&ConfigValue::from(MASK)));
        assert_eq!(
            masked.get("global", "admin_username"),
            Some(&ConfigValue::from("admin"))
        );
        // Absent secrets are not invented.
        assert!(!masked.contains("global", "admin_password"));
    }

    #[test]
    fn test_layer_text() {
        let text = format_layer_text(&sample_layer());
        assert_eq!(
            text,
            "[global]\nadmin_username = \"admin\"\napi_key = \"secret-key\"\n\n[server]\nport = 8000\n"
        );
    }

    #[test]
    fn test_layer_json() {
        let json = format_layer(&sample_layer(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["server"]["port"], 8000);
    }

    #[test]
    fn test_layer_toml_parses_back() {
        let out = format_layer(&sample_layer(), OutputFormat::Toml).unwrap();
        let table: toml::Table = toml::from_str(&out).unwrap();
        assert_eq!(table["server"]["port"].as_integer(), Some(8000));
    }

    #[test]
    fn test_overrides_text() {
        let mut report = BTreeMap::new();
        report.insert(
            "FLOW2API_PORT".to_string(),
            OverrideInfo {
                section: "server".to_string(),
                key: "port".to_string(),
                env_value: "9000".to_string(),
                config_value: Some(ConfigValue::Integer(9000)),
            },
        );
        let text = format_overrides_text(&report);
        assert!(text.contains("FLOW2API_PORT -> server.port [integer] env=\"9000\" effective=9000"));
    }

    #[test]
    fn test_overrides_empty() {
        let text = format_overrides_text(&BTreeMap::new());
        assert!(text.starts_with("No FLOW2API_"));
    }

    #[test]
    fn test_mask_overrides() {
        let mut report = BTreeMap::new();
        report.insert(
            "FLOW2API_API_KEY".to_string(),
            OverrideInfo {
                section: "global".to_string(),
                key: "api_key".to_string(),
                env_value: "sk-live".to_string(),
                config_value: Some(ConfigValue::from("sk-live")),
            },
        );
        let masked = mask_overrides(&report);
        let info = &masked["FLOW2API_API_KEY"];
        assert_eq!(info.env_value, MASK);
        assert_eq!(info.config_value, Some(ConfigValue::from(MASK)));
    }
}
