//! Error types for token processing and configuration

/// Failures reported by `MusicComposer::process_entry`
///
/// A failed entry never changes composer state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComposeError {
    #[error("Unrecognized token: {0:?}")]
    UnrecognizedToken(String),

    #[error("Track {index} out of range ({tracks} tracks)")]
    TrackOutOfRange { index: i64, tracks: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Failures while loading or validating a `ComposerConfig`
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// A `ComposeError` located within a token script
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("line {line}, token {token:?}: {source}")]
pub struct ScriptError {
    pub line: usize,
    pub token: String,
    #[source]
    pub source: ComposeError,
}
