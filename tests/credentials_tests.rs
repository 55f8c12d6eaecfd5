//! Integration tests for pushing admin credentials from a store into the resolver.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use flow2api_config::config::{
    AdminCredentials, ConfigPaths, ConfigResolver, ConfigValue, CredentialSource,
};
use flow2api_config::error::{ConfigError, ErrorCode};
use tempfile::TempDir;

/// In-memory stand-in for the admin table.
struct FakeStore {
    row: Mutex<Option<AdminCredentials>>,
    fail: bool,
}

impl FakeStore {
    fn with(credentials: Option<AdminCredentials>) -> Self {
        Self {
            row: Mutex::new(credentials),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            row: Mutex::new(None),
            fail: true,
        }
    }
}

#[async_trait]
impl CredentialSource for FakeStore {
    async fn admin_credentials(&self) -> anyhow::Result<Option<AdminCredentials>> {
        if self.fail {
            anyhow::bail!("database is locked");
        }
        Ok(self.row.lock().unwrap().clone())
    }
}

fn load(temp: &TempDir) -> ConfigResolver {
    let path = temp.path().join("setting.toml");
    std::fs::write(
        &path,
        r#"
[global]
api_key = "k"
admin_username = "admin"
admin_password = "admin"

[server]
host = "127.0.0.1"
port = 8000
"#,
    )
    .unwrap();
    ConfigResolver::load_with(ConfigPaths::with_file(path), HashMap::<String, String>::new())
        .expect("Failed to load config")
}

#[tokio::test]
async fn test_credentials_from_store_take_precedence() {
    let temp = TempDir::new().unwrap();
    let config = load(&temp);
    let store = FakeStore::with(Some(AdminCredentials::new("root", "s3cret")));

    let applied = config.load_admin_credentials(&store).await.unwrap();
    assert!(applied);
    assert_eq!(config.admin_username().unwrap(), "root");
    assert_eq!(config.admin_password().unwrap(), "s3cret");

    config.reload().unwrap();
    assert_eq!(config.admin_username().unwrap(), "root");
    assert_eq!(
        config.raw_layer().get("global", "admin_password"),
        Some(&ConfigValue::from("s3cret"))
    );
}

#[tokio::test]
async fn test_empty_store_leaves_file_values() {
    let temp = TempDir::new().unwrap();
    let config = load(&temp);
    let store = FakeStore::with(None);

    let applied = config.load_admin_credentials(&store).await.unwrap();
    assert!(!applied);
    assert_eq!(config.admin_username().unwrap(), "admin");
    assert!(!config.snapshot().has_admin_override());
}

#[tokio::test]
async fn test_store_error_changes_nothing() {
    let temp = TempDir::new().unwrap();
    let config = load(&temp);
    let before = config.raw_layer();

    let err = config
        .load_admin_credentials(&FakeStore::failing())
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::Credentials(_)));
    assert_eq!(err.code(), ErrorCode::CredentialStore);
    assert_eq!(config.raw_layer(), before);
}

#[test]
fn test_apply_admin_credentials_sets_both_fields() {
    let temp = TempDir::new().unwrap();
    let config = load(&temp);

    config.apply_admin_credentials(&AdminCredentials::new("ops", "pw"));
    let snapshot = config.snapshot();
    assert_eq!(snapshot.admin_username().unwrap(), "ops");
    assert_eq!(snapshot.admin_password().unwrap(), "pw");
}
