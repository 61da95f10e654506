use thiserror::Error;

#[derive(Error, Debug)]
pub enum KmlCableError {
    #[error("empty KML input")]
    Empty,

    #[error("KML parse error: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("conversion cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, KmlCableError>;
