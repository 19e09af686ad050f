/// Errors raised while loading or validating [`Settings`](crate::config::Settings).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration value: {key} (set {env_var})")]
    Missing {
        key: &'static str,
        env_var: &'static str,
    },

    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Failed to read settings file {path}: {reason}")]
    File { path: String, reason: String },
}

/// Conditions that make the poller give up and stop the process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    /// Azure DevOps answered with 203, its response to a rejected PAT.
    #[error("PAT might be misconfigured (HTTP 203)")]
    CredentialMisconfigured,

    /// The organization or base URL does not resolve to a project list.
    #[error("A URL might be misconfigured (HTTP 404)")]
    UrlMisconfigured,
}
