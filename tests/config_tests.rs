// ABOUTME: Tests for configuration loading and validation
// ABOUTME: Verifies TOML parsing, env var overrides, and secret redaction

use std::io::Write;

use chirp::commands::RegistrationPolicy;
use chirp::config::Config;
use serial_test::serial;

/// Helper to clear all config-related env vars
fn clear_config_env_vars() {
    std::env::remove_var("CHIRP_CONFIG_PATH");
    std::env::remove_var("CHIRP_TOKEN");
    std::env::remove_var("CHIRP_TEST_TOKEN");
    std::env::remove_var("CHIRP_READY_TIMEOUT_SECS");
    std::env::remove_var("CHIRP_REGISTRATION");
    std::env::remove_var("STATS_URL");
    std::env::remove_var("STATS_API_KEY");
}

#[test]
#[serial]
fn test_defaults_without_file_or_env() {
    clear_config_env_vars();
    // Point the config path somewhere that does not exist so a developer's
    // local config.toml cannot leak into the test.
    std::env::set_var("CHIRP_CONFIG_PATH", "/nonexistent/chirp-config.toml");

    let config = Config::load().unwrap();

    assert!(config.bot.token.is_empty());
    assert!(!config.presence.statuses.is_empty());
    assert_eq!(config.presence.interval_secs, 16);
    assert_eq!(config.presence.initial_delay_secs, 1);
    assert_eq!(config.commands.registration, RegistrationPolicy::Fail);
    assert!(config.stats.url.is_none());
    assert!(!config.is_test_identity());
}

#[test]
#[serial]
fn test_config_loads_from_toml_file() {
    clear_config_env_vars();

    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    let config_content = r#"
[bot]
token = "file-token"
test_token = "test-token"
ready_timeout_secs = 30

[presence]
statuses = ["/help | one", "/help | two"]
interval_secs = 8
initial_delay_secs = 2

[commands]
registration = "skip"

[stats]
url = "https://stats.example.com/bots/1"
api_key = "stats-key"
"#;
    let mut file = std::fs::File::create(&config_path).unwrap();
    file.write_all(config_content.as_bytes()).unwrap();
    std::env::set_var("CHIRP_CONFIG_PATH", config_path.to_str().unwrap());

    let config = Config::load().unwrap();

    assert_eq!(config.bot.token, "file-token");
    assert_eq!(config.bot.ready_timeout_secs, 30);
    assert_eq!(config.presence.statuses.len(), 2);
    assert_eq!(config.presence.interval_secs, 8);
    assert_eq!(config.commands.registration, RegistrationPolicy::Skip);
    assert_eq!(
        config.stats.url.as_deref(),
        Some("https://stats.example.com/bots/1")
    );

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_env_vars_override_file() {
    clear_config_env_vars();

    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "[bot]\ntoken = \"file-token\"\n").unwrap();
    std::env::set_var("CHIRP_CONFIG_PATH", config_path.to_str().unwrap());
    std::env::set_var("CHIRP_TOKEN", "env-token");
    std::env::set_var("CHIRP_REGISTRATION", "skip");
    std::env::set_var("STATS_URL", "https://stats.example.com/bots/2");

    let config = Config::load().unwrap();

    assert_eq!(config.bot.token, "env-token");
    assert_eq!(config.commands.registration, RegistrationPolicy::Skip);
    assert_eq!(
        config.stats.url.as_deref(),
        Some("https://stats.example.com/bots/2")
    );

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_invalid_env_values_are_ignored() {
    clear_config_env_vars();
    std::env::set_var("CHIRP_CONFIG_PATH", "/nonexistent/chirp-config.toml");
    std::env::set_var("CHIRP_READY_TIMEOUT_SECS", "not-a-number");
    std::env::set_var("CHIRP_REGISTRATION", "loudly");

    let config = Config::load().unwrap();

    assert_eq!(config.bot.ready_timeout_secs, 60);
    assert_eq!(config.commands.registration, RegistrationPolicy::Fail);

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_test_identity_detection() {
    clear_config_env_vars();
    std::env::set_var("CHIRP_CONFIG_PATH", "/nonexistent/chirp-config.toml");
    std::env::set_var("CHIRP_TOKEN", "shared-token");
    std::env::set_var("CHIRP_TEST_TOKEN", "shared-token");

    let config = Config::load().unwrap();
    assert!(config.is_test_identity());

    std::env::set_var("CHIRP_TEST_TOKEN", "different-token");
    let config = Config::load().unwrap();
    assert!(!config.is_test_identity());

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_debug_output_redacts_secrets() {
    clear_config_env_vars();
    std::env::set_var("CHIRP_CONFIG_PATH", "/nonexistent/chirp-config.toml");
    std::env::set_var("CHIRP_TOKEN", "very-secret-token");
    std::env::set_var("STATS_API_KEY", "very-secret-key");

    let config = Config::load().unwrap();
    let debug = format!("{:?}", config);

    assert!(!debug.contains("very-secret-token"));
    assert!(!debug.contains("very-secret-key"));
    assert!(debug.contains("[REDACTED]"));

    clear_config_env_vars();
}
