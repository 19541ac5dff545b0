use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlateError {
    #[error("Invalid image: {width}x{height}")]
    InvalidImage { width: u32, height: u32 },

    #[error("Failed to load image {origin}: {source}")]
    ImageLoad {
        /// Path of the image, or `<bytes>` for in-memory input
        origin: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Recognition failed: {0}")]
    Recognition(String),

    #[error("Failed to encode region: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlateError {
    /// Errors that invalidate the whole image rather than a single region
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PlateError::Recognition(_) | PlateError::Encode(_))
    }
}

pub type Result<T> = std::result::Result<T, PlateError>;
