#![allow(clippy::unwrap_used)]
// File layering and profile translation tests.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;

use aula_config::{
    Config, Profile, load_config_from, profile_to_console_config, save_config_to,
};
use aula_core::TlsVerification;

const SAMPLE: &str = r#"
default_profile = "sala"

[defaults]
output = "json"
log_limit = 50

[profiles.sala]
server = "http://aula.local:5000"
timeout_secs = 5

[profiles.lab]
server = "https://lab.example.org"
username = "operador1"
password = "clave-lab"
insecure = true
"#;

#[test]
fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, SAMPLE).unwrap();

    let config = load_config_from(&path).unwrap();
    assert_eq!(config.default_profile.as_deref(), Some("sala"));
    assert_eq!(config.defaults.output, "json");
    assert_eq!(config.defaults.color, "auto");
    assert_eq!(config.defaults.timeout_secs, 30);
    assert_eq!(config.defaults.log_poll_secs, 10);
    assert_eq!(config.defaults.log_limit, 50);
    assert_eq!(config.profiles.len(), 2);
    assert!(!config.profiles["sala"].insecure);
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.defaults, Config::default().defaults);
    assert!(config.profiles.is_empty());
}

#[test]
fn save_then_load_preserves_profiles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.profiles.insert(
        "default".into(),
        Profile {
            server: "http://127.0.0.1:5000".into(),
            username: Some("admin".into()),
            password_env: Some("SALA_PASSWORD".into()),
            ..Profile::default()
        },
    );
    save_config_to(&path, &config).unwrap();

    let loaded = load_config_from(&path).unwrap();
    assert_eq!(loaded.profiles, config.profiles);
}

#[test]
fn sessionless_profile_translates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, SAMPLE).unwrap();
    let config = load_config_from(&path).unwrap();

    let console =
        profile_to_console_config(&config.profiles["sala"], "sala", &config.defaults).unwrap();
    assert_eq!(console.url.as_str(), "http://aula.local:5000/");
    assert!(console.credentials.is_none());
    assert_eq!(console.timeout, Duration::from_secs(5));
    assert_eq!(console.log_poll_interval, Duration::from_secs(10));
    assert_eq!(console.log_limit, 50);
    assert_eq!(console.tls, TlsVerification::SystemDefaults);
}

#[test]
fn plaintext_password_is_last_resort() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, SAMPLE).unwrap();
    let config = load_config_from(&path).unwrap();

    let console =
        profile_to_console_config(&config.profiles["lab"], "lab", &config.defaults).unwrap();
    let creds = console.credentials.unwrap();
    assert_eq!(creds.username, "operador1");
    if std::env::var("AULA_PASSWORD").is_err() {
        assert_eq!(creds.password.expose_secret(), "clave-lab");
    }
    assert_eq!(console.tls, TlsVerification::DangerAcceptInvalid);
}

#[test]
fn invalid_server_url_is_rejected() {
    let profile = Profile {
        server: "not a url".into(),
        ..Profile::default()
    };
    let err = profile_to_console_config(&profile, "x", &Config::default().defaults).unwrap_err();
    assert!(err.to_string().contains("invalid server"));
}
