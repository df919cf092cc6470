use site_sentry_config::{Config, ConfigError, LogLevel, OverlayConfig};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert!(config.sync.list_source_url.starts_with("https://"));
    assert_eq!(config.sync.refresh_period_minutes, 1);
    assert_eq!(config.sync.http_timeout_secs, 30);
    assert!(!config.sync.allow_insecure_http);
    assert!(config.sync.allowed_hosts.is_empty());
    assert_eq!(config.store_path, None);
    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(config.overlay, OverlayConfig::default());
    assert_eq!(config.overlay.title, "WARNING: Restricted Website Detected");
    assert_eq!(config.overlay.dismiss_label, "Acknowledge and Close");
}

#[test]
fn test_config_builders() {
    let config = Config::new()
        .with_list_source("https://lists.example/webs.txt")
        .with_refresh_period_minutes(15)
        .with_store_path("/tmp/store.json");
    assert_eq!(config.sync.list_source_url, "https://lists.example/webs.txt");
    assert_eq!(config.refresh_period().as_secs(), 15 * 60);
    assert_eq!(config.store_path.as_deref(), Some("/tmp/store.json"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_full_yaml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(
        &path,
        r#"
list_source_url: http://intranet.example/webs.txt
allow_insecure_http: true
allowed_hosts: [intranet.example]
refresh_period_minutes: 10
http_timeout_secs: 5
max_list_bytes: 4096
store_path: /var/lib/site-sentry/storage.json
log_level: debug
injection_denied_hosts: [admin.example]
overlay:
  title: Heads up
  dismiss_label: Got it
  width: 40
"#,
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.sync.list_source_url, "http://intranet.example/webs.txt");
    assert_eq!(config.sync.allowed_hosts, vec!["intranet.example".to_string()]);
    assert_eq!(config.sync.http_timeout().as_secs(), 5);
    assert_eq!(config.sync.max_list_bytes, 4096);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.injection_denied_hosts, vec!["admin.example".to_string()]);
    assert_eq!(config.overlay.dismiss_label, "Got it");
    assert_eq!(config.overlay.width, 40);
    assert_eq!(
        config.resolved_store_path(dir.path()),
        std::path::PathBuf::from("/var/lib/site-sentry/storage.json")
    );
}

#[test]
fn test_narrow_overlay_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(&path, "overlay:\n  width: 10\n").unwrap();

    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::Validation(_))
    ));
}

#[test]
fn test_unknown_log_level_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(&path, "log_level: chatty\n").unwrap();

    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::Parse(_))
    ));
}

#[test]
fn test_saved_file_reloads_identically() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.yaml");

    let mut config = Config::new().with_refresh_period_minutes(5);
    config.overlay.title = "Careful".to_string();
    config.save_to(&path).unwrap();

    assert_eq!(Config::load_from(&path).unwrap(), config);
}
