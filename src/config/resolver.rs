//! Shareable configuration handle.
//!
//! State is an immutable [`ConfigState`] published through `ArcSwap`. Readers
//! load one snapshot per call and never block; writers (runtime setters and the
//! swap at the end of a reload) serialize on a write lock and publish a fresh
//! copy. Reload reads the file before taking the write lock, so readers and
//! setters are never held up by file I/O.
//!
//! Precedence, highest first: admin runtime override > environment > file >
//! accessor default.

use super::credentials::{AdminCredentials, CredentialSource};
use super::env::{
    ENV_MAPPINGS, EnvSource, OverrideInfo, ProcessEnv, apply_env_overrides_with_report,
    describe_overrides,
};
use super::layer::{ConfigLayer, load_layer};
use super::paths::ConfigPaths;
use super::settings::Settings;
use crate::error::{ConfigError, ConfigResult};
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use tracing::{debug, info, warn};

/// One published configuration snapshot.
#[derive(Debug, Clone)]
pub struct ConfigState {
    layer: ConfigLayer,
    settings: Settings,
    admin_username: Option<String>,
    admin_password: Option<String>,
    generation: u64,
    loaded_at: DateTime<Utc>,
}

impl ConfigState {
    /// The merged file + environment layer, including runtime setter writes.
    pub fn layer(&self) -> &ConfigLayer {
        &self.layer
    }

    /// Typed view of [`Self::layer`]. Admin runtime overrides are not applied here.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Number of successful reloads since construction.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// When the file was last (re)loaded.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn admin_username(&self) -> ConfigResult<String> {
        match &self.admin_username {
            Some(username) => Ok(username.clone()),
            None => self.settings.admin_username(),
        }
    }

    pub fn admin_password(&self) -> ConfigResult<String> {
        match &self.admin_password {
            Some(password) => Ok(password.clone()),
            None => self.settings.admin_password(),
        }
    }

    /// Whether an admin override from a runtime source is in effect.
    pub fn has_admin_override(&self) -> bool {
        self.admin_username.is_some() || self.admin_password.is_some()
    }

    fn store_admin_username(&mut self, username: &str) {
        self.admin_username = Some(username.to_string());
        self.layer.set("global", "admin_username", username);
        self.settings.global.admin_username = Some(username.to_string());
    }

    fn store_admin_password(&mut self, password: &str) {
        self.admin_password = Some(password.to_string());
        self.layer.set("global", "admin_password", password);
        self.settings.global.admin_password = Some(password.to_string());
    }
}

struct Inner {
    paths: ConfigPaths,
    env: Arc<dyn EnvSource>,
    state: ArcSwap<ConfigState>,
    write_lock: Mutex<()>,
    reload_lock: Mutex<()>,
}

/// Layered configuration resolver.
///
/// Cheap to clone; clones share state. Pass it to whatever needs settings
/// instead of reaching for a global.
#[derive(Clone)]
pub struct ConfigResolver {
    inner: Arc<Inner>,
}

impl fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.load();
        f.debug_struct("ConfigResolver")
            .field("config_file", &self.inner.paths.config_file)
            .field("generation", &state.generation)
            .field("loaded_at", &state.loaded_at)
            .finish()
    }
}

/// Read the file and apply environment overrides.
fn load_merged(paths: &ConfigPaths, env: &dyn EnvSource) -> ConfigResult<(ConfigLayer, Settings)> {
    let file_layer = load_layer(paths.config_file())?;
    let outcome = apply_env_overrides_with_report(file_layer, ENV_MAPPINGS, env);
    let settings = Settings::from_layer(&outcome.layer)?;
    info!(
        path = %paths.config_file().display(),
        overrides = outcome.applied.len(),
        skipped = outcome.skipped.len(),
        "Configuration loaded"
    );
    Ok((outcome.layer, settings))
}

impl ConfigResolver {
    /// Load from the discovered config file and the process environment.
    pub fn load() -> ConfigResult<Self> {
        Self::load_with(ConfigPaths::discover(), ProcessEnv)
    }

    /// Load from an explicit file and environment source.
    pub fn load_with(paths: ConfigPaths, env: impl EnvSource + 'static) -> ConfigResult<Self> {
        let env: Arc<dyn EnvSource> = Arc::new(env);
        let (layer, settings) = load_merged(&paths, env.as_ref())?;
        let state = ConfigState {
            layer,
            settings,
            admin_username: None,
            admin_password: None,
            generation: 0,
            loaded_at: Utc::now(),
        };
        Ok(Self {
            inner: Arc::new(Inner {
                paths,
                env,
                state: ArcSwap::from_pointee(state),
                write_lock: Mutex::new(()),
                reload_lock: Mutex::new(()),
            }),
        })
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.inner.paths
    }

    /// Current snapshot, for reading several fields consistently.
    pub fn snapshot(&self) -> Arc<ConfigState> {
        self.inner.state.load_full()
    }

    /// Copy of the merged layer as it is now, including runtime setter writes.
    pub fn raw_layer(&self) -> ConfigLayer {
        self.inner.state.load().layer.clone()
    }

    /// Typed view of the merged layer.
    pub fn settings(&self) -> Settings {
        self.inner.state.load().settings.clone()
    }

    /// Environment variables currently set, with the value each resolved to.
    pub fn describe_overrides(&self) -> BTreeMap<String, OverrideInfo> {
        let state = self.inner.state.load();
        describe_overrides(ENV_MAPPINGS, self.inner.env.as_ref(), &state.layer)
    }

    // Required settings

    pub fn api_key(&self) -> ConfigResult<String> {
        self.inner.state.load().settings.api_key()
    }

    /// Runtime override if set, otherwise the merged layer.
    pub fn admin_username(&self) -> ConfigResult<String> {
        self.inner.state.load().admin_username()
    }

    /// Runtime override if set, otherwise the merged layer.
    pub fn admin_password(&self) -> ConfigResult<String> {
        self.inner.state.load().admin_password()
    }

    pub fn flow_labs_base_url(&self) -> ConfigResult<String> {
        self.inner.state.load().settings.flow_labs_base_url()
    }

    pub fn flow_api_base_url(&self) -> ConfigResult<String> {
        self.inner.state.load().settings.flow_api_base_url()
    }

    pub fn flow_timeout(&self) -> ConfigResult<i64> {
        self.inner.state.load().settings.flow_timeout()
    }

    pub fn flow_max_retries(&self) -> ConfigResult<i64> {
        self.inner.state.load().settings.flow_max_retries()
    }

    pub fn poll_interval(&self) -> ConfigResult<f64> {
        self.inner.state.load().settings.poll_interval()
    }

    pub fn max_poll_attempts(&self) -> ConfigResult<i64> {
        self.inner.state.load().settings.max_poll_attempts()
    }

    pub fn server_host(&self) -> ConfigResult<String> {
        self.inner.state.load().settings.server_host()
    }

    pub fn server_port(&self) -> ConfigResult<i64> {
        self.inner.state.load().settings.server_port()
    }

    // Settings with defaults

    pub fn debug_enabled(&self) -> bool {
        self.inner.state.load().settings.debug.enabled
    }

    pub fn debug_log_requests(&self) -> bool {
        self.inner.state.load().settings.debug.log_requests
    }

    pub fn debug_log_responses(&self) -> bool {
        self.inner.state.load().settings.debug.log_responses
    }

    pub fn debug_mask_token(&self) -> bool {
        self.inner.state.load().settings.debug.mask_token
    }

    pub fn proxy_enabled(&self) -> bool {
        self.inner.state.load().settings.proxy.proxy_enabled
    }

    pub fn proxy_url(&self) -> Option<String> {
        self.inner.state.load().settings.proxy.proxy_url.clone()
    }

    /// Image generation timeout in seconds.
    pub fn image_timeout(&self) -> i64 {
        self.inner.state.load().settings.generation.image_timeout
    }

    /// Video generation timeout in seconds.
    pub fn video_timeout(&self) -> i64 {
        self.inner.state.load().settings.generation.video_timeout
    }

    pub fn cache_enabled(&self) -> bool {
        self.inner.state.load().settings.cache.enabled
    }

    /// Cache lifetime in seconds.
    pub fn cache_timeout(&self) -> i64 {
        self.inner.state.load().settings.cache.timeout
    }

    pub fn cache_base_url(&self) -> String {
        self.inner.state.load().settings.cache.base_url.clone()
    }

    // Runtime setters

    /// Set the admin username from a runtime source.
    ///
    /// Writes the override slot, which survives reload, and the merged layer.
    pub fn set_admin_username_from_db(&self, username: &str) {
        self.update(|state| state.store_admin_username(username));
        debug!("Admin username set from runtime source");
    }

    /// Set the admin password from a runtime source.
    ///
    /// Writes the override slot, which survives reload, and the merged layer.
    pub fn set_admin_password_from_db(&self, password: &str) {
        self.update(|state| state.store_admin_password(password));
        debug!("Admin password set from runtime source");
    }

    /// Set both admin fields in one write.
    pub fn apply_admin_credentials(&self, credentials: &AdminCredentials) {
        self.update(|state| {
            state.store_admin_username(&credentials.username);
            state.store_admin_password(&credentials.password);
        });
        debug!(username = %credentials.username, "Admin credentials applied");
    }

    /// Fetch admin credentials from `source` and apply them.
    ///
    /// Returns `false` if the source has none. On error nothing changes.
    pub async fn load_admin_credentials(
        &self,
        source: &dyn CredentialSource,
    ) -> ConfigResult<bool> {
        match source
            .admin_credentials()
            .await
            .map_err(ConfigError::Credentials)?
        {
            Some(credentials) => {
                self.apply_admin_credentials(&credentials);
                Ok(true)
            }
            None => {
                debug!("Credential source has no admin credentials");
                Ok(false)
            }
        }
    }

    /// Replace the API key in the merged layer until the next reload.
    pub fn set_api_key(&self, api_key: &str) {
        self.update(|state| {
            state.layer.set("global", "api_key", api_key);
            state.settings.global.api_key = Some(api_key.to_string());
        });
        debug!("API key updated");
    }

    pub fn set_debug_enabled(&self, enabled: bool) {
        self.update(|state| {
            state.layer.set("debug", "enabled", enabled);
            state.settings.debug.enabled = enabled;
        });
        debug!(enabled, "Debug mode updated");
    }

    pub fn set_image_timeout(&self, timeout: i64) {
        self.update(|state| {
            state.layer.set("generation", "image_timeout", timeout);
            state.settings.generation.image_timeout = timeout;
        });
        debug!(timeout, "Image timeout updated");
    }

    pub fn set_video_timeout(&self, timeout: i64) {
        self.update(|state| {
            state.layer.set("generation", "video_timeout", timeout);
            state.settings.generation.video_timeout = timeout;
        });
        debug!(timeout, "Video timeout updated");
    }

    pub fn set_cache_enabled(&self, enabled: bool) {
        self.update(|state| {
            state.layer.set("cache", "enabled", enabled);
            state.settings.cache.enabled = enabled;
        });
        debug!(enabled, "Cache enabled updated");
    }

    pub fn set_cache_timeout(&self, timeout: i64) {
        self.update(|state| {
            state.layer.set("cache", "timeout", timeout);
            state.settings.cache.timeout = timeout;
        });
        debug!(timeout, "Cache timeout updated");
    }

    pub fn set_cache_base_url(&self, base_url: &str) {
        self.update(|state| {
            state.layer.set("cache", "base_url", base_url);
            state.settings.cache.base_url = base_url.to_string();
        });
        debug!(base_url, "Cache base URL updated");
    }

    /// Rebuild the merged layer from the file and the environment.
    ///
    /// The previous state stays published until the new one has loaded, so a
    /// failed reload leaves the configuration as it was. Runtime setter writes
    /// are discarded; admin overrides are kept and written into the new layer.
    /// A reload started while another is running fails with
    /// [`ConfigError::ReloadInProgress`].
    pub fn reload(&self) -> ConfigResult<ConfigLayer> {
        let _reloading = match self.inner.reload_lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                warn!("Config reload requested while another reload is running; rejecting");
                return Err(ConfigError::ReloadInProgress);
            }
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        info!(
            "Reloading configuration from {}",
            self.inner.paths.config_file().display()
        );
        let (layer, settings) = match load_merged(&self.inner.paths, self.inner.env.as_ref()) {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("Config reload failed: {}. Keeping current config.", e);
                return Err(e);
            }
        };

        let _writing = self.write_guard();
        let current = self.inner.state.load();
        let mut next = ConfigState {
            layer,
            settings,
            admin_username: None,
            admin_password: None,
            generation: current.generation + 1,
            loaded_at: Utc::now(),
        };
        if let Some(username) = &current.admin_username {
            next.store_admin_username(username);
        }
        if let Some(password) = &current.admin_password {
            next.store_admin_password(password);
        }

        let layer = next.layer.clone();
        self.inner.state.store(Arc::new(next));
        info!(generation = current.generation + 1, "Configuration reloaded");
        Ok(layer)
    }

    fn write_guard(&self) -> MutexGuard<'_, ()> {
        // The lock guards no data, so a poisoned lock is safe to reuse.
        self.inner
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy-on-write update of the published state.
    fn update(&self, apply: impl FnOnce(&mut ConfigState)) {
        let _writing = self.write_guard();
        let mut next = ConfigState::clone(&self.inner.state.load());
        apply(&mut next);
        self.inner.state.store(Arc::new(next));
    }
}
