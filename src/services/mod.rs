//! Services turning the process environment into a settings snapshot.
pub mod loader;

/// Convenience alias for loader results.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Errors surfaced while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to build environment source: {0}")]
    Source(#[source] config::ConfigError),
    #[error("value of `{key}` is not valid unicode")]
    NonUnicode { key: String },
    #[error("invalid {group} settings: {source}")]
    Coercion {
        group: &'static str,
        #[source]
        source: config::ConfigError,
    },
}
