//! Inspection subcommands: show, overrides, get.

use crate::config::ConfigResolver;
use crate::format::{
    OutputFormat, format_layer, format_overrides, is_secret, mask_layer, mask_overrides, MASK,
};
use anyhow::{Result, anyhow, bail};
use clap::Args;
use std::io::Write;

/// Arguments for the show subcommand
#[derive(Args, Debug, Default)]
pub struct ShowArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print secrets (api key, admin password) instead of masking them
    #[arg(long)]
    pub reveal: bool,
}

/// Arguments for the overrides subcommand
#[derive(Args, Debug, Default)]
pub struct OverridesArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print secrets instead of masking them
    #[arg(long)]
    pub reveal: bool,
}

/// Arguments for the get subcommand
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Dotted key, `section.key`
    #[arg(value_name = "SECTION.KEY")]
    pub key: String,

    /// Print secrets instead of masking them
    #[arg(long)]
    pub reveal: bool,
}

pub fn run_show(config: &ConfigResolver, args: &ShowArgs, out: &mut impl Write) -> Result<()> {
    let layer = config.raw_layer();
    let layer = if args.reveal { layer } else { mask_layer(&layer) };
    let rendered = format_layer(&layer, args.format)?;
    write_block(out, &rendered)
}

pub fn run_overrides(
    config: &ConfigResolver,
    args: &OverridesArgs,
    out: &mut impl Write,
) -> Result<()> {
    let report = config.describe_overrides();
    let report = if args.reveal {
        report
    } else {
        mask_overrides(&report)
    };
    let rendered = format_overrides(&report, args.format)?;
    write_block(out, &rendered)
}

pub fn run_get(config: &ConfigResolver, args: &GetArgs, out: &mut impl Write) -> Result<()> {
    let (section, key) = args
        .key
        .split_once('.')
        .ok_or_else(|| anyhow!("expected SECTION.KEY, got '{}'", args.key))?;

    let layer = config.raw_layer();
    let Some(value) = layer.get(section, key) else {
        bail!("{}.{} is not set", section, key);
    };

    if is_secret(section, key) && !args.reveal {
        writeln!(out, "{}", MASK)?;
    } else {
        writeln!(out, "{}", value)?;
    }
    Ok(())
}

fn write_block(out: &mut impl Write, rendered: &str) -> Result<()> {
    out.write_all(rendered.as_bytes())?;
    if !rendered.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigPaths;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn resolver(temp: &TempDir, env: &[(&str, &str)]) -> ConfigResolver {
        let path = temp.path().join("setting.toml");
        std::fs::write(
            &path,
            "[global]\napi_key = \"sk-file\"\nadmin_username = \"admin\"\n\n[server]\nport = 8000\n",
        )
        .unwrap();
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConfigResolver::load_with(ConfigPaths::with_file(path), env).unwrap()
    }

    fn output(run: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        run(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_show_masks_secrets_by_default() {
        let temp = TempDir::new().unwrap();
        let config = resolver(&temp, &[]);
        let text = output(|out| run_show(&config, &ShowArgs::default(), out));
        assert!(text.contains("api_key = \"***\""));
        assert!(!text.contains("sk-file"));
        assert!(text.contains("port = 8000"));
    }

    #[test]
    fn test_show_reveal() {
        let temp = TempDir::new().unwrap();
        let config = resolver(&temp, &[]);
        let args = ShowArgs {
            format: OutputFormat::Text,
            reveal: true,
        };
        let text = output(|out| run_show(&config, &args, out));
        assert!(text.contains("sk-file"));
    }

    #[test]
    fn test_overrides_json() {
        let temp = TempDir::new().unwrap();
        let config = resolver(&temp, &[("FLOW2API_PORT", "9000")]);
        let args = OverridesArgs {
            format: OutputFormat::Json,
            reveal: false,
        };
        let text = output(|out| run_overrides(&config, &args, out));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["FLOW2API_PORT"]["config_value"], 9000);
        assert_eq!(value["FLOW2API_PORT"]["env_value"], "9000");
    }

    #[test]
    fn test_get_value_and_missing() {
        let temp = TempDir::new().unwrap();
        let config = resolver(&temp, &[]);

        let args = GetArgs {
            key: "server.port".to_string(),
            reveal: false,
        };
        assert_eq!(output(|out| run_get(&config, &args, out)), "8000\n");

        let missing = GetArgs {
            key: "cache.enabled".to_string(),
            reveal: false,
        };
        assert!(run_get(&config, &missing, &mut Vec::new()).is_err());

        let malformed = GetArgs {
            key: "port".to_string(),
            reveal: false,
        };
        assert!(run_get(&config, &malformed, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_get_masks_secret() {
        let temp = TempDir::new().unwrap();
        let config = resolver(&temp, &[]);
        let args = GetArgs {
            key: "global.api_key".to_string(),
            reveal: false,
        };
        assert_eq!(output(|out| run_get(&config, &args, out)), "***\n");
    }
}
