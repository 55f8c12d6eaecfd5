//! Layered configuration.
//!
//! Resolves settings from three tiers, highest precedence first:
//! 1. **Runtime** - admin credentials set after startup (e.g. from a database);
//!    these survive [`ConfigResolver::reload`]
//! 2. **Environment** - `FLOW2API_*` variables, see [`ENV_MAPPINGS`]
//! 3. **File** - `config/setting.toml` (or `FLOW2API_CONFIG_PATH`)
//!
//! Settings with a documented default fall back to it when no tier sets them.
//!
//! ## Environment Variables
//! - `FLOW2API_API_KEY`, `FLOW2API_ADMIN_USERNAME`, `FLOW2API_ADMIN_PASSWORD`
//! - `FLOW2API_LABS_BASE_URL`, `FLOW2API_API_BASE_URL`, `FLOW2API_TIMEOUT`,
//!   `FLOW2API_MAX_RETRIES`, `FLOW2API_POLL_INTERVAL`, `FLOW2API_MAX_POLL_ATTEMPTS`
//! - `FLOW2API_HOST`, `FLOW2API_PORT`
//! - `FLOW2API_DEBUG_ENABLED`, `FLOW2API_DEBUG_LOG_REQUESTS`,
//!   `FLOW2API_DEBUG_LOG_RESPONSES`, `FLOW2API_DEBUG_MASK_TOKEN`
//! - `FLOW2API_PROXY_ENABLED`, `FLOW2API_PROXY_URL`
//! - `FLOW2API_IMAGE_TIMEOUT`, `FLOW2API_VIDEO_TIMEOUT`
//! - `FLOW2API_CACHE_ENABLED`, `FLOW2API_CACHE_TIMEOUT`, `FLOW2API_CACHE_BASE_URL`
//!
//! Numeric variables that fail to parse are ignored with a warning. Boolean
//! variables are true for `true`, `1`, `yes`, `on` or `enabled` (any case).

mod credentials;
mod env;
mod layer;
mod merge;
mod paths;
mod resolver;
mod settings;

pub use credentials::{AdminCredentials, CredentialSource};
pub use env::{
    Converter, ENV_MAPPINGS, EnvMapping, EnvOverrideOutcome, EnvSource, OverrideInfo, ProcessEnv,
    TRUTHY_TOKENS, apply_env_overrides, apply_env_overrides_with_report, describe_overrides,
    find_mapping, parse_bool, parse_float, parse_integer,
};
pub use layer::{ConfigLayer, ConfigValue, Section, load_layer, parse_layer};
pub use merge::{merge_all, merge_layers};
pub use paths::{CONFIG_PATH_VAR, ConfigPaths, DEFAULT_CONFIG_FILE};
pub use resolver::{ConfigResolver, ConfigState};
pub use settings::*;
