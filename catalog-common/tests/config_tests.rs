//! Tests for configuration and root folder resolution
//!
//! Uses serial_test to prevent races on the CATALOG_ROOT_FOLDER variable.
//! Tests that touch the environment are marked #[serial].

use catalog_common::config::{
    CompiledDefaults, RootFolderInitializer, RootFolderResolver, TomlConfig, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

/// Resolver that never sees the developer's real config file
fn isolated_resolver(dir: &TempDir) -> RootFolderResolver {
    RootFolderResolver::new("test-module")
        .with_config_path(Some(dir.path().join("missing.toml")))
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);
    let dir = TempDir::new().unwrap();

    let root_folder = isolated_resolver(&dir).resolve();

    assert!(!root_folder.as_os_str().is_empty());
    assert_eq!(root_folder, CompiledDefaults::for_current_platform().root_folder);
}

#[test]
#[serial]
fn test_resolver_env_var() {
    let dir = TempDir::new().unwrap();
    env::set_var(ROOT_FOLDER_ENV, "/tmp/catalog-test-env-folder");

    let root_folder = isolated_resolver(&dir).resolve();
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(root_folder, PathBuf::from("/tmp/catalog-test-env-folder"));
}

#[test]
#[serial]
fn test_cli_arg_beats_env_var() {
    let dir = TempDir::new().unwrap();
    env::set_var(ROOT_FOLDER_ENV, "/tmp/from-env");

    let root_folder = isolated_resolver(&dir)
        .with_cli_arg(Some(PathBuf::from("/tmp/from-cli")))
        .resolve();
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(root_folder, PathBuf::from("/tmp/from-cli"));
}

#[test]
#[serial]
fn test_toml_root_folder_used_when_no_env() {
    env::remove_var(ROOT_FOLDER_ENV);
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "root_folder = \"/srv/catalog\"\n").unwrap();

    let root_folder = RootFolderResolver::new("test-module")
        .with_config_path(Some(config_path))
        .resolve();

    assert_eq!(root_folder, PathBuf::from("/srv/catalog"));
}

#[test]
fn test_invalid_toml_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "this is [not toml").unwrap();

    assert!(TomlConfig::load(&config_path).is_err());
    assert_eq!(TomlConfig::load_or_default(&config_path), TomlConfig::default());
}

#[test]
fn test_missing_toml_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let config = TomlConfig::load_or_default(&dir.path().join("nope.toml"));
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_dedup_section_parsed() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        r#"
[logging]
level = "debug"

[dedup]
bind_addr = "0.0.0.0:8080"
store_timeout_ms = 250
include_empty_code = false
"#,
    )
    .unwrap();

    let config = TomlConfig::load(&config_path).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.dedup.bind_addr, "0.0.0.0:8080");
    assert_eq!(config.dedup.store_timeout_ms, 250);
    assert!(!config.dedup.include_empty_code);
    assert!(!config.dedup.prefer_native_encoding);
}

#[test]
fn test_initializer_creates_directory() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("a").join("b");

    let init = RootFolderInitializer::new(root.clone());
    init.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(init.database_path(), root.join("catalog.db"));
}
