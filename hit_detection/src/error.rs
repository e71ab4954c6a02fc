use thiserror::Error;

/// Errors surfaced by arming and by the configuration/data loaders.
///
/// Runtime geometry failures while tracing are not errors: they end the trace and are logged.
#[derive(Error, Debug)]
pub enum HitDetectionError {
    #[error("Attack not found: {0}")]
    AttackNotFound(String),

    #[error("Attack {0} has an empty combo sequence")]
    EmptyCombo(String),

    #[error("Attack key {0} is not supported by this data source")]
    UnsupportedAttackKey(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, HitDetectionError>;
