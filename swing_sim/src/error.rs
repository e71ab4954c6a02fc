use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Hit detection error: {0}")]
    HitDetection(#[from] hit_detection::HitDetectionError),

    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
