//! Poller configuration.
//!
//! Values come from two layers: an optional JSON settings file using the
//! `AzureDevOps` / `ExampleBackgroundService` section layout, and environment
//! variables, which take precedence. [`Settings`] is validated once at
//! startup and never mutated afterwards.
//!
//! | Key                                               | Env var                                | Default   |
//! |---------------------------------------------------|----------------------------------------|-----------|
//! | `AzureDevOps:BaseUrl`                             | `AZURE_DEVOPS_BASE_URL`                | --        |
//! | `AzureDevOps:Pat`                                 | `AZURE_DEVOPS_PAT`                     | --        |
//! | `AzureDevOps:Organization`                        | `AZURE_DEVOPS_ORGANIZATION`            | `ablcode` |
//! | `AzureDevOps:RequestTimeoutSeconds`               | `AZURE_DEVOPS_REQUEST_TIMEOUT_SECONDS` | `30`      |
//! | `ExampleBackgroundService:PollingIntervalSeconds` | `POLLING_INTERVAL_SECONDS`             | `60`      |
//!
//! The settings file path is read from `ADO_SETTINGS_FILE`; when unset,
//! `appsettings.json` in the working directory is used if it exists.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Seconds between two polls when nothing is configured.
pub const DEFAULT_POLLING_INTERVAL_SECS: u64 = 60;

/// Upper bound on a single request when nothing is configured.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Organization polled when nothing is configured.
pub const DEFAULT_ORGANIZATION: &str = "ablcode";

/// Settings file looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "appsettings.json";

pub const SETTINGS_FILE_ENV: &str = "ADO_SETTINGS_FILE";

pub const KEY_BASE_URL: &str = "AzureDevOps:BaseUrl";
pub const KEY_PAT: &str = "AzureDevOps:Pat";
pub const KEY_ORGANIZATION: &str = "AzureDevOps:Organization";
pub const KEY_REQUEST_TIMEOUT: &str = "AzureDevOps:RequestTimeoutSeconds";
pub const KEY_POLLING_INTERVAL: &str = "ExampleBackgroundService:PollingIntervalSeconds";

pub const ENV_BASE_URL: &str = "AZURE_DEVOPS_BASE_URL";
pub const ENV_PAT: &str = "AZURE_DEVOPS_PAT";
pub const ENV_ORGANIZATION: &str = "AZURE_DEVOPS_ORGANIZATION";
pub const ENV_REQUEST_TIMEOUT: &str = "AZURE_DEVOPS_REQUEST_TIMEOUT_SECONDS";
pub const ENV_POLLING_INTERVAL: &str = "POLLING_INTERVAL_SECONDS";

// ---------------------------------------------------------------------------
// Settings file
// ---------------------------------------------------------------------------

/// Deserialized shape of the JSON settings file.
///
/// Every value is optional; unknown sections are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsFile {
    #[serde(rename = "AzureDevOps", default)]
    pub azure_devops: AzureDevOpsSection,
    #[serde(rename = "ExampleBackgroundService", default)]
    pub example_background_service: BackgroundServiceSection,
    #[serde(rename = "Logging", default)]
    pub logging: LoggingSection,
    #[serde(rename = "Serilog", default)]
    pub serilog: SerilogSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AzureDevOpsSection {
    pub base_url: Option<String>,
    pub pat: Option<String>,
    pub organization: Option<String>,
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BackgroundServiceSection {
    pub polling_interval_seconds: Option<u64>,
}

/// `Logging: { LogLevel: { Default: "Information", ... } }`.
#[derive(Debug, Default, Deserialize)]
pub struct LoggingSection {
    #[serde(rename = "LogLevel", default)]
    pub log_level: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SerilogSection {
    #[serde(rename = "MinimumLevel")]
    pub minimum_level: Option<MinimumLevel>,
}

/// Serilog accepts either `"MinimumLevel": "Debug"` or
/// `"MinimumLevel": { "Default": "Debug", "Override": { ... } }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MinimumLevel {
    Plain(String),
    Detailed {
        #[serde(rename = "Default")]
        default: Option<String>,
    },
}

impl SettingsFile {
    /// Locate and parse the settings file named by `ADO_SETTINGS_FILE`, or
    /// `appsettings.json` in the working directory if that exists.
    ///
    /// A missing default file yields `None`; a file named explicitly must
    /// exist.
    pub fn discover() -> Result<Option<Self>, ConfigError> {
        match std::env::var(SETTINGS_FILE_ENV) {
            Ok(path) => Self::load(Path::new(&path)).map(Some),
            Err(_) => {
                let default = Path::new(DEFAULT_SETTINGS_FILE);
                if default.is_file() {
                    Self::load(default).map(Some)
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Default log level from the file as a tracing level name.
    ///
    /// `Serilog:MinimumLevel` wins over `Logging:LogLevel:Default`.
    /// Unrecognised level names are ignored.
    pub fn log_level(&self) -> Option<&'static str> {
        let serilog = match &self.serilog.minimum_level {
            Some(MinimumLevel::Plain(level)) => Some(level.as_str()),
            Some(MinimumLevel::Detailed { default }) => default.as_deref(),
            None => None,
        };

        serilog
            .and_then(tracing_level)
            .or_else(|| {
                self.logging
                    .log_level
                    .get("Default")
                    .and_then(|level| tracing_level(level))
            })
    }

    /// Read and parse a settings file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file_error = |reason: String| ConfigError::File {
            path: path.display().to_string(),
            reason,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| file_error(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Validated poller configuration.
#[derive(Clone)]
pub struct Settings {
    /// Azure DevOps base URL without a trailing slash, e.g. `https://dev.azure.com`.
    pub base_url: String,
    /// Personal access token used as the Basic auth password.
    pub pat: String,
    /// Organization whose projects are listed.
    pub organization: String,
    pub polling_interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("base_url", &self.base_url)
            .field("pat", &"<redacted>")
            .field("organization", &self.organization)
            .field("polling_interval_secs", &self.polling_interval_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Settings {
    /// Load settings from the optional settings file and the process
    /// environment.
    ///
    /// A missing default `appsettings.json` is fine; a file named explicitly
    /// through `ADO_SETTINGS_FILE` must exist.
    pub fn from_env() -> Result<Self, ConfigError> {
        let file = SettingsFile::discover()?;
        Self::from_sources(file, |name| std::env::var(name).ok())
    }

    /// Merge a settings file with environment lookups and validate the result.
    ///
    /// `lookup` resolves an environment variable name; blank values count as
    /// unset.
    pub fn from_sources<F>(file: Option<SettingsFile>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let SettingsFile {
            azure_devops,
            example_background_service,
            ..
        } = file.unwrap_or_default();

        let env = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let base_url = env(ENV_BASE_URL)
            .or(azure_devops.base_url)
            .ok_or(ConfigError::Missing {
                key: KEY_BASE_URL,
                env_var: ENV_BASE_URL,
            })?;

        let pat = env(ENV_PAT)
            .or(azure_devops.pat)
            .filter(|p| !p.trim().is_empty())
            .ok_or(ConfigError::Missing {
                key: KEY_PAT,
                env_var: ENV_PAT,
            })?;

        let organization = env(ENV_ORGANIZATION)
            .or(azure_devops.organization)
            .unwrap_or_else(|| DEFAULT_ORGANIZATION.to_string());

        let request_timeout_secs = match env(ENV_REQUEST_TIMEOUT) {
            Some(raw) => parse_secs(KEY_REQUEST_TIMEOUT, &raw)?,
            None => azure_devops
                .request_timeout_seconds
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let polling_interval_secs = match env(ENV_POLLING_INTERVAL) {
            Some(raw) => parse_secs(KEY_POLLING_INTERVAL, &raw)?,
            None => example_background_service
                .polling_interval_seconds
                .unwrap_or(DEFAULT_POLLING_INTERVAL_SECS),
        };

        let settings = Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            pat,
            organization: organization.trim().to_string(),
            polling_interval_secs,
            request_timeout_secs,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check the invariants every loaded configuration must satisfy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let host = self
            .base_url
            .strip_prefix("https://")
            .or_else(|| self.base_url.strip_prefix("http://"));
        if host.map_or(true, str::is_empty) {
            return Err(ConfigError::Invalid {
                key: KEY_BASE_URL,
                reason: format!("'{}' is not an absolute http(s) URL", self.base_url),
            });
        }

        if !is_valid_organization(&self.organization) {
            return Err(ConfigError::Invalid {
                key: KEY_ORGANIZATION,
                reason: format!("'{}' is not a valid organization name", self.organization),
            });
        }

        if self.polling_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: KEY_POLLING_INTERVAL,
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: KEY_REQUEST_TIMEOUT,
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Organization names are interpolated into the request path, so only
/// alphanumerics, hyphen, underscore and dot are accepted.
fn is_valid_organization(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 128
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Map a Microsoft.Extensions.Logging / Serilog level name onto a tracing
/// level name.
fn tracing_level(level: &str) -> Option<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" | "verbose" => Some("trace"),
        "debug" => Some("debug"),
        "information" | "info" => Some("info"),
        "warning" | "warn" => Some("warn"),
        "error" | "critical" | "fatal" => Some("error"),
        "none" => Some("off"),
        _ => None,
    }
}

fn parse_secs(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Invalid {
        key,
        reason: format!("'{raw}' is not a whole number of seconds"),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
