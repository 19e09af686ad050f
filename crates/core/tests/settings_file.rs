//! Integration tests for loading the JSON settings file from disk.

use std::io::Write;

use ado_core::config::{Settings, SettingsFile, ENV_BASE_URL, ENV_PAT};
use ado_core::error::ConfigError;
use assert_matches::assert_matches;

fn write_settings(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file should be created");
    file.write_all(contents.as_bytes())
        .expect("temp file should be writable");
    file
}

/// A complete file yields settings without any environment input.
#[test]
fn file_alone_is_enough() {
    let file = write_settings(
        r#"{
            "Logging": { "LogLevel": { "Default": "Information" } },
            "AzureDevOps": {
                "BaseUrl": "https://dev.azure.com/",
                "Pat": "file-pat",
                "Organization": "contoso"
            },
            "ExampleBackgroundService": { "PollingIntervalSeconds": 10 }
        }"#,
    );

    let parsed = SettingsFile::load(file.path()).expect("file should parse");
    let settings = Settings::from_sources(Some(parsed), |_| None).expect("settings are valid");

    assert_eq!(settings.base_url, "https://dev.azure.com");
    assert_eq!(settings.pat, "file-pat");
    assert_eq!(settings.organization, "contoso");
    assert_eq!(settings.polling_interval_secs, 10);
}

/// Omitting the polling section falls back to the 60 second default.
#[test]
fn missing_section_uses_default_interval() {
    let file = write_settings(r#"{ "AzureDevOps": { "BaseUrl": "https://dev.azure.com" } }"#);

    let parsed = SettingsFile::load(file.path()).expect("file should parse");
    let settings = Settings::from_sources(Some(parsed), |name| {
        (name == ENV_PAT).then(|| "env-pat".to_string())
    })
    .expect("settings are valid");

    assert_eq!(settings.polling_interval_secs, 60);
}

/// Malformed JSON is reported as a file error naming the path.
#[test]
fn malformed_json_is_a_file_error() {
    let file = write_settings("{ not json");

    let err = SettingsFile::load(file.path()).unwrap_err();
    assert_matches!(err, ConfigError::File { ref path, .. } if path.contains(
        file.path().file_name().unwrap().to_str().unwrap()
    ));
}

/// A path that does not exist is reported as a file error.
#[test]
fn missing_file_is_a_file_error() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let err = SettingsFile::load(&dir.path().join("absent.json")).unwrap_err();
    assert_matches!(err, ConfigError::File { .. });
}

/// A negative interval cannot be represented and fails to parse.
#[test]
fn negative_interval_fails_to_parse() {
    let file = write_settings(
        r#"{ "ExampleBackgroundService": { "PollingIntervalSeconds": -5 } }"#,
    );
    assert_matches!(SettingsFile::load(file.path()), Err(ConfigError::File { .. }));
}

/// Zero from the file is caught by validation, same as from the environment.
#[test]
fn zero_interval_from_file_is_rejected() {
    let file = write_settings(
        r#"{ "ExampleBackgroundService": { "PollingIntervalSeconds": 0 } }"#,
    );
    let parsed = SettingsFile::load(file.path()).expect("file should parse");

    let err = Settings::from_sources(Some(parsed), |name| match name {
        ENV_BASE_URL => Some("https://dev.azure.com".to_string()),
        ENV_PAT => Some("p".to_string()),
        _ => None,
    })
    .unwrap_err();

    assert_matches!(err, ConfigError::Invalid { .. });
}

/// The `Serilog` section of a settings file supplies the default log level.
#[test]
fn serilog_section_supplies_log_level() {
    let file = write_settings(
        r#"{
            "Serilog": { "MinimumLevel": { "Default": "Warning" } },
            "AzureDevOps": { "BaseUrl": "https://dev.azure.com", "Pat": "p" }
        }"#,
    );

    let parsed = SettingsFile::load(file.path()).expect("file should parse");
    assert_eq!(parsed.log_level(), Some("warn"));
}
