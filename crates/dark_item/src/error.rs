use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Geometric computation error: {0}")]
    Geometry(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for DetectError {
    fn from(err: image::ImageError) -> Self {
        DetectError::InvalidInput(format!("failed to decode image: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, DetectError>;
