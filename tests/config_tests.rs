//! Tests for configuration module

use std::time::Duration;

use centerbook::config::{Config, CONFIG};

#[test]
fn test_config_defaults() {
    let config = Config::from_env();

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.scheduling.default_timezone, "Europe/Paris");
    assert_eq!(config.scheduling.status_grace, Duration::from_secs(5 * 60));
    assert_eq!(config.scheduling.reminder_lead, Duration::from_secs(3 * 60 * 60));
    assert_eq!(config.scheduling.reminder_window, Duration::from_secs(15 * 60));
    assert!(config.scheduling.auto_confirm);
}

#[test]
fn test_database_url_format() {
    let config = Config::from_env();

    assert!(
        config.database.database_url.starts_with("postgres://")
            || config.database.database_url.starts_with("sqlite:"),
        "Unexpected database URL: {}",
        config.database.database_url
    );
}

#[test]
fn test_version_from_cargo() {
    let config = Config::from_env();
    assert!(!config.version.is_empty());
    assert!(config.version.contains('.'));
}

#[test]
fn test_email_disabled_without_api_key() {
    let config = Config::from_env();
    assert!(config.email.api_key.is_none());
    assert!(!config.email.public_url.ends_with('/'));
}

#[test]
fn test_cron_secret_hidden_from_debug() {
    let mut config = Config::from_env();
    config.security.cron_secret = Some("super-secret-value".to_string());

    let debug_str = format!("{:?}", config);
    assert!(debug_str.contains("cron_secret"));
    assert!(!debug_str.contains("super-secret-value"));
}

#[test]
fn test_global_config_accessible() {
    let config = &*CONFIG;
    assert!(config.server.port > 0);
    assert!(!config.log_level.is_empty());
}
