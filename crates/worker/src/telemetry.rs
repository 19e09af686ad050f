//! Tracing subscriber setup.
//!
//! The filter comes from `RUST_LOG`, then the settings file level, then
//! `ado_worker=info`. Setting
//! `LOG_FORMAT=json` switches the console output to one JSON object per
//! line, with the current `poll` span (and its `execution_id`) attached.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_FILTER: &str = "ado_worker=info";

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Interpret a `LOG_FORMAT` value. Anything other than `json` is text.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }

    pub fn from_env() -> Self {
        Self::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref())
    }
}

/// Filter used when `RUST_LOG` is unset: the settings file level for this
/// crate, or [`DEFAULT_FILTER`].
pub fn default_filter(file_level: Option<&str>) -> String {
    match file_level {
        Some(level) => format!("ado_worker={level}"),
        None => DEFAULT_FILTER.to_string(),
    }
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(format: LogFormat, file_level: Option<&str>) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(file_level).into());

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_case_insensitive() {
        assert_eq!(LogFormat::parse(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some(" JSON ")), LogFormat::Json);
    }

    #[test]
    fn file_level_sets_default_filter() {
        assert_eq!(default_filter(Some("debug")), "ado_worker=debug");
        assert_eq!(default_filter(None), DEFAULT_FILTER);
    }

    #[test]
    fn anything_else_is_text() {
        assert_eq!(LogFormat::parse(None), LogFormat::Text);
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Text);
        assert_eq!(LogFormat::parse(Some("")), LogFormat::Text);
    }
}
