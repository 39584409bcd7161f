//! Error types for the editor core

use thiserror::Error;

/// Reasons an image can be refused at load time.
///
/// Every variant is recoverable: the session stays in its pre-load state and
/// the user can pick another file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Declared type is not one of the accepted raster formats
    #[error("Unsupported image type '{0}': choose a PNG or JPEG file")]
    UnsupportedFormat(String),

    /// File is larger than the configured byte ceiling
    #[error("File is too large: {size} bytes (limit {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    /// Decoded width or height exceeds the configured pixel ceiling
    #[error("Image dimensions too large: {width}x{height} (limit {limit}px per side)")]
    DimensionTooLarge { width: u32, height: u32, limit: u32 },

    /// Bytes could not be parsed as an image
    #[error("Could not decode image: {0}")]
    DecodeError(#[source] image::ImageError),

    /// File could not be read from disk
    #[error("Could not read file: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejected "enter blur mode" requests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArmError {
    #[error("Load an image before selecting a region to blur")]
    NoImage,

    #[error("Blur mode is already active")]
    AlreadyArmed,
}

/// Export failures. None of these touch the working buffer.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("There is no image to export")]
    NoImage,

    #[error("Failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

/// Settings file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for load operations
pub type LoadResult<T> = Result<T, LoadError>;
